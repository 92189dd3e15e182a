//! UI Components

use leptos::prelude::*;

use crate::api::{Answer, ToolCallRecord};
use crate::markdown;

/// Warning or error banner
#[component]
pub fn Banner(kind: &'static str, message: String) -> impl IntoView {
    let class = format!("banner banner-{kind}");

    view! {
        <div class=class role="alert">{message}</div>
    }
}

/// Tools the agents ran for an answer, in call order
#[component]
pub fn ToolCallList(calls: Vec<ToolCallRecord>) -> impl IntoView {
    if calls.is_empty() {
        return None;
    }

    let items = calls
        .into_iter()
        .map(|record| {
            let class = if record.success { "tool-call" } else { "tool-call failed" };
            view! {
                <li class=class title=record.tool>
                    <code>{record.call}</code>
                    <span class="agent">{record.agent}</span>
                </li>
            }
        })
        .collect_view();

    Some(view! {
        <details class="tool-calls" open=true>
            <summary>"Tools used"</summary>
            <ul>{items}</ul>
        </details>
    })
}

/// Answer text plus the tool calls behind it
#[component]
pub fn AnswerCard(answer: Answer) -> impl IntoView {
    let meta = format!("{} · {} · ~{} tokens", answer.mode, answer.model, answer.token_estimate);
    let body = markdown::to_html(&answer.content);

    view! {
        <article class="answer">
            <ToolCallList calls=answer.tool_calls />
            <div class="content markdown" inner_html=body></div>
            <footer class="meta">{meta}</footer>
        </article>
    }
}
