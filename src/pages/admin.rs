//! Administration page: user list, deletion, and per-user history.

#[cfg(test)]
#[path = "admin_test.rs"]
mod admin_test;

use leptos::prelude::*;

use crate::app::AppGateway;
use crate::net::types::{QuestionRecord, UserDto};
use crate::pages::qna::preview;
use crate::state::auth::AuthState;

/// Admins may delete anyone but themselves, and only records with an id.
pub(crate) fn can_delete(target: &UserDto, signed_in_as: Option<&str>) -> bool {
    target.id.is_some() && signed_in_as != Some(target.username.as_str())
}

pub(crate) fn user_label(user: &UserDto) -> String {
    let role = user.role.unwrap_or_default();
    match &user.email {
        Some(email) if !email.is_empty() => format!("{} <{email}> ({role})", user.username),
        _ => format!("{} ({role})", user.username),
    }
}

#[component]
pub fn AdminPage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let gateway = expect_context::<AppGateway>();
    let users = RwSignal::new(Vec::<UserDto>::new());
    let selected = RwSignal::new(None::<(String, Vec<QuestionRecord>)>);
    let info = RwSignal::new(String::new());

    #[cfg(feature = "csr")]
    {
        let gateway = gateway.clone();
        leptos::task::spawn_local(async move {
            match crate::net::api::list_users(&gateway).await {
                Ok(list) => users.set(list),
                Err(e) => info.set(e),
            }
        });
    }

    let on_history = Callback::new({
        let gateway = gateway.clone();
        move |(id, username): (String, String)| {
            #[cfg(feature = "csr")]
            {
                let gateway = gateway.clone();
                leptos::task::spawn_local(async move {
                    match crate::net::api::user_history(&gateway, &id).await {
                        Ok(records) => selected.set(Some((username, records))),
                        Err(e) => info.set(e),
                    }
                });
            }
            #[cfg(not(feature = "csr"))]
            {
                let _ = (&gateway, id, username);
            }
        }
    });

    let on_delete = Callback::new(move |id: String| {
        #[cfg(feature = "csr")]
        {
            let gateway = gateway.clone();
            leptos::task::spawn_local(async move {
                match crate::net::api::delete_user(&gateway, &id).await {
                    Ok(()) => {
                        users.update(|list| list.retain(|u| u.id.as_deref() != Some(id.as_str())));
                        info.set("User deleted.".to_owned());
                    }
                    Err(e) => info.set(e),
                }
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (&gateway, id);
        }
    });

    view! {
        <section class="admin-page">
            <h1>"Users"</h1>
            <Show when=move || !info.get().is_empty()>
                <p class="admin-page__info">{move || info.get()}</p>
            </Show>
            <table class="admin-page__users">
                <tbody>
                    {move || {
                        let me = auth.get().username().map(str::to_owned);
                        users
                            .get()
                            .into_iter()
                            .map(|user| {
                                let deletable = can_delete(&user, me.as_deref());
                                let label = user_label(&user);
                                let id = user.id.clone().unwrap_or_default();
                                let history_key = (id.clone(), user.username.clone());
                                view! {
                                    <tr>
                                        <td>{label}</td>
                                        <td>
                                            <button
                                                class="btn btn--small"
                                                on:click=move |_| on_history.run(history_key.clone())
                                            >
                                                "History"
                                            </button>
                                            <Show when=move || deletable>
                                                <button
                                                    class="btn btn--small btn--danger"
                                                    on:click={
                                                        let id = id.clone();
                                                        move |_| on_delete.run(id.clone())
                                                    }
                                                >
                                                    "Delete"
                                                </button>
                                            </Show>
                                        </td>
                                    </tr>
                                }
                            })
                            .collect_view()
                    }}
                </tbody>
            </table>
            {move || selected.get().map(|(username, records)| view! {
                <div class="admin-page__history">
                    <h2>{format!("History of {username}")}</h2>
                    <ul>
                        {records
                            .into_iter()
                            .map(|r| view! { <li>{preview(&r.question)}</li> })
                            .collect_view()}
                    </ul>
                </div>
            })}
        </section>
    }
}
