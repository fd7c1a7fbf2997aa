//! ナビゲーションバー

use crate::app::Page;
use leptos::prelude::*;

#[component]
pub fn Navbar(page: ReadSignal<Page>, set_page: WriteSignal<Page>) -> impl IntoView {
    view! {
        <header class="navbar">
            <h1>"🦺 Safety Detect"</h1>
            <nav>
                {Page::ALL
                    .into_iter()
                    .map(|target| {
                        view! {
                            <button
                                class=move || if page.get() == target { "nav-link active" } else { "nav-link" }
                                on:click=move |_| set_page.set(target)
                            >
                                {target.label()}
                            </button>
                        }
                    })
                    .collect_view()}
            </nav>
        </header>
    }
}
