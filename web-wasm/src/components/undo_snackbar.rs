//! 「History updated.」スナックバー

use leptos::prelude::*;

#[component]
pub fn UndoSnackbar<F>(visible: Signal<bool>, on_undo: F) -> impl IntoView
where
    F: Fn() + 'static + Clone + Send + Sync,
{
    view! {
        <Show when=move || visible.get()>
            <div class="snackbar">
                <span>"History updated."</span>
                <button
                    class="btn btn-link"
                    on:click={
                        let on_undo = on_undo.clone();
                        move |_| on_undo()
                    }
                >
                    "Undo"
                </button>
            </div>
        </Show>
    }
}
