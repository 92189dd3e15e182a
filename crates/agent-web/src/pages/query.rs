//! Query Page

use leptos::prelude::*;

use crate::api::{self, Answer, ModesResponse, QueryError};
use crate::components::{AnswerCard, Banner};

const EMPTY_INPUT_WARNING: &str = "Please enter a question before submitting.";

#[component]
pub fn QueryPage() -> impl IntoView {
    let (catalog, set_catalog) = signal(ModesResponse::default());
    let (mode, set_mode) = signal(String::from("combined"));
    let (max_tokens, set_max_tokens) = signal(String::new());
    let (input, set_input) = signal(String::new());
    let (in_flight, set_in_flight) = signal(false);
    let (answer, set_answer) = signal(None::<Answer>);
    let (problem, set_problem) = signal(None::<QueryError>);

    leptos::task::spawn_local(async move {
        match api::fetch_modes().await {
            Ok(modes) => {
                set_max_tokens.set(modes.default_max_tokens.to_string());
                set_catalog.set(modes);
            }
            Err(e) => set_problem.set(Some(QueryError::Failure(e))),
        }
    });

    let submit = move || {
        if in_flight.get() {
            return;
        }
        let query = input.get();
        if query.trim().is_empty() {
            set_problem.set(Some(QueryError::Warning(EMPTY_INPUT_WARNING.into())));
            return;
        }
        let limit = max_tokens.get().trim().parse::<u32>().ok();
        let selected = mode.get();

        set_problem.set(None);
        set_in_flight.set(true);

        leptos::task::spawn_local(async move {
            match api::send_query(&query, &selected, limit).await {
                Ok(reply) => set_answer.set(Some(reply)),
                Err(e) => {
                    set_answer.set(None);
                    set_problem.set(Some(e));
                }
            }
            set_in_flight.set(false);
        });
    };

    view! {
        <div class="query">
            <aside class="sidebar">
                <h2>"Settings"</h2>
                <div class="field">
                    <label>"Mode"</label>
                    <select on:change=move |ev| set_mode.set(event_target_value(&ev))>
                        <For
                            each=move || catalog.get().modes
                            key=|m| m.id.clone()
                            children=move |m| {
                                let id = m.id.clone();
                                view! {
                                    <option
                                        value=m.id
                                        title=m.description
                                        selected=move || mode.get() == id
                                    >
                                        {m.label}
                                    </option>
                                }
                            }
                        />
                    </select>
                </div>
                <div class="field">
                    <label>"Max response length (tokens)"</label>
                    <input
                        type="number"
                        min="1"
                        max="8192"
                        prop:value=move || max_tokens.get()
                        on:input=move |ev| set_max_tokens.set(event_target_value(&ev))
                    />
                </div>

                <h3>"Examples"</h3>
                <ul class="examples">
                    <For
                        each=move || catalog.get().examples
                        key=String::clone
                        children=move |prompt| {
                            let text = prompt.clone();
                            view! {
                                <li>
                                    <button
                                        class="example"
                                        on:click=move |_| set_input.set(text.clone())
                                    >
                                        {prompt}
                                    </button>
                                </li>
                            }
                        }
                    />
                </ul>
            </aside>

            <main class="query-main">
                <div class="input-area">
                    <textarea
                        placeholder="Ask about a stock, a company or the news..."
                        prop:value=move || input.get()
                        on:input=move |ev| set_input.set(event_target_value(&ev))
                        on:keydown=move |ev| {
                            if ev.key() == "Enter" && (ev.ctrl_key() || ev.meta_key()) {
                                ev.prevent_default();
                                submit();
                            }
                        }
                    />
                    <button on:click=move |_| submit() disabled=move || in_flight.get()>
                        {move || if in_flight.get() { "Researching..." } else { "Ask" }}
                    </button>
                </div>

                {move || problem.get().map(|p| match p {
                    QueryError::Warning(message) => view! { <Banner kind="warning" message=message /> },
                    QueryError::Failure(message) => view! { <Banner kind="error" message=message /> },
                })}

                <Show when=move || in_flight.get()>
                    <div class="loading">"Agents are working on it..."</div>
                </Show>

                {move || answer.get().map(|a| view! { <AnswerCard answer=a /> })}
            </main>
        </div>
    }
}
