//! Main App Component

use leptos::prelude::*;
use leptos_router::{components::*, path};

use crate::pages::QueryPage;

/// Root application component
#[component]
pub fn App() -> impl IntoView {
    view! {
        <Router>
            <header class="topbar">
                <h1>"Market research agents"</h1>
            </header>
            <main class="app">
                <Routes fallback=|| view! { <p>"Page not found"</p> }>
                    <Route path=path!("/") view=QueryPage />
                </Routes>
            </main>
        </Router>
    }
}
