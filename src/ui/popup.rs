/// Popup UI for the Echo Escape extension

use std::future::Future;
use std::rc::Rc;

use yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use patternfly_yew::prelude::*;
use crate::analysis::{analyze_current_page, save_result};
use crate::api::{ApiClient, ReqwestTransport};
use crate::auth::AuthFlow;
use crate::browser::{self, ChromeIdentity, ChromeMessenger, ChromeStorage};
use crate::config::Config;
use crate::inflight::InFlight;
use crate::model::{AnalysisResult, Credentials};
use crate::session::{EXTENSION_KEYS, SessionStore};
use crate::state::{PopupAction, PopupState, PopupView};
use crate::ui::components::{CredentialsForm, Loading, NoticeBanner, ResultCard};

type PopupAuth = AuthFlow<ReqwestTransport, ChromeStorage>;

/// Everything the popup talks to, built once the stored config is read
#[derive(Clone)]
struct Services {
    auth: Rc<PopupAuth>,
    config: Rc<Config>,
}

impl Services {
    async fn load() -> Services {
        let config = Config::load(&ChromeStorage::local()).await;
        let api = ApiClient::new(ReqwestTransport::new(&config));
        let sessions = SessionStore::new(ChromeStorage::sync(), EXTENSION_KEYS);

        Services {
            auth: Rc::new(AuthFlow::new(api, sessions)),
            config: Rc::new(config),
        }
    }
}

/// Run `action` under the busy guard. Its outcome is dispatched only if no
/// newer action or logout superseded it in the meantime.
fn guarded<F>(
    in_flight: &InFlight,
    dispatcher: UseReducerDispatcher<PopupState>,
    started: PopupAction,
    action: F,
) where
    F: Future<Output = PopupAction> + 'static,
{
    let Some(ticket) = in_flight.start() else {
        log::debug!("Ignoring click while another request is running");
        return;
    };

    dispatcher.dispatch(started);
    spawn_local(async move {
        let finished = action.await;
        if ticket.is_current() {
            drop(ticket);
            dispatcher.dispatch(finished);
        } else {
            log::debug!("Dropping stale result");
        }
    });
}

#[function_component(App)]
pub fn app() -> Html {
    let state = use_reducer(PopupState::default);
    let services = use_state(|| None::<Services>);
    let in_flight = use_state(InFlight::new);

    // Read config, then verify any stored session before showing a view
    {
        let dispatcher = state.dispatcher();
        let services = services.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                let loaded = Services::load().await;
                let resumed = loaded.auth.resume().await;
                services.set(Some(loaded));
                dispatcher.dispatch(PopupAction::Resumed(resumed));
            });
            || ()
        });
    }

    let on_login = {
        let dispatcher = state.dispatcher();
        let services = (*services).clone();
        let in_flight = (*in_flight).clone();
        Callback::from(move |credentials: Credentials| {
            let Some(services) = services.clone() else {
                return;
            };
            guarded(&in_flight, dispatcher.clone(), PopupAction::Submitting, async move {
                PopupAction::LoggedIn(services.auth.login(&credentials).await)
            });
        })
    };

    let on_register = {
        let dispatcher = state.dispatcher();
        let services = (*services).clone();
        let in_flight = (*in_flight).clone();
        Callback::from(move |credentials: Credentials| {
            let Some(services) = services.clone() else {
                return;
            };
            guarded(&in_flight, dispatcher.clone(), PopupAction::Submitting, async move {
                PopupAction::Registered(services.auth.register(&credentials).await)
            });
        })
    };

    let on_google = {
        let dispatcher = state.dispatcher();
        let services = (*services).clone();
        let in_flight = (*in_flight).clone();
        Callback::from(move |_: MouseEvent| {
            let Some(services) = services.clone() else {
                return;
            };
            guarded(&in_flight, dispatcher.clone(), PopupAction::Submitting, async move {
                PopupAction::LoggedIn(services.auth.sign_in_with_google(&ChromeIdentity).await)
            });
        })
    };

    // Server-side Google flow; the callback page reports back to the background
    let on_google_in_tab = {
        let services = (*services).clone();
        Callback::from(move |_: MouseEvent| {
            let Some(services) = services.clone() else {
                return;
            };
            spawn_local(async move {
                match browser::open_tab(&services.config.google_login_url("extension")).await {
                    Ok(()) => browser::close_window(),
                    Err(e) => log::error!("Could not open Google sign-in: {}", e),
                }
            });
        })
    };

    let on_forgot_password = {
        let services = (*services).clone();
        Callback::from(move |_: MouseEvent| {
            let Some(services) = services.clone() else {
                return;
            };
            spawn_local(async move {
                if let Err(e) = browser::open_tab(&services.config.password_reset_url()).await {
                    log::error!("Could not open password reset: {}", e);
                }
            });
        })
    };

    let on_show_register = {
        let dispatcher = state.dispatcher();
        Callback::from(move |_: MouseEvent| dispatcher.dispatch(PopupAction::ShowRegister))
    };

    let on_show_login = {
        let dispatcher = state.dispatcher();
        Callback::from(move |_: MouseEvent| dispatcher.dispatch(PopupAction::ShowLogin))
    };

    let on_logout = {
        let dispatcher = state.dispatcher();
        let services = (*services).clone();
        let in_flight = (*in_flight).clone();
        Callback::from(move |_: MouseEvent| {
            in_flight.supersede();
            let dispatcher = dispatcher.clone();
            let services = services.clone();
            spawn_local(async move {
                if let Some(services) = services {
                    if let Err(e) = services.auth.logout().await {
                        log::error!("Logout failed to clear storage: {}", e);
                    }
                }
                dispatcher.dispatch(PopupAction::LoggedOut);
            });
        })
    };

    let on_analyze = {
        let dispatcher = state.dispatcher();
        let services = (*services).clone();
        let in_flight = (*in_flight).clone();
        Callback::from(move |_: MouseEvent| {
            let Some(services) = services.clone() else {
                return;
            };
            guarded(&in_flight, dispatcher.clone(), PopupAction::AnalysisStarted, async move {
                let auth = &services.auth;
                let outcome = analyze_current_page(&ChromeMessenger, auth.sessions(), auth.api()).await;
                if let Err(e) = &outcome {
                    log::error!("Analysis failed: {}", e);
                    auth.end_if_unauthorized(e).await;
                }
                PopupAction::AnalysisFinished(outcome)
            });
        })
    };

    let on_toggle_save = {
        let dispatcher = state.dispatcher();
        Callback::from(move |e: Event| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                dispatcher.dispatch(PopupAction::SetSaveToHistory(input.checked()));
            }
        })
    };

    let on_save = {
        let dispatcher = state.dispatcher();
        let services = (*services).clone();
        let in_flight = (*in_flight).clone();
        let result: Option<AnalysisResult> = state.result.clone();
        let save_to_history = state.save_to_history;
        let token = match &state.view {
            PopupView::Analysis(session) => Some(session.token.clone()),
            _ => None,
        };
        Callback::from(move |_: MouseEvent| {
            let (Some(services), Some(result), Some(token)) = (services.clone(), result.clone(), token.clone()) else {
                return;
            };
            guarded(&in_flight, dispatcher.clone(), PopupAction::SaveStarted, async move {
                let auth = &services.auth;
                let outcome = save_result(auth.api(), &result, &token, save_to_history).await;
                if let Err(e) = &outcome {
                    auth.end_if_unauthorized(e).await;
                }
                PopupAction::SaveFinished(outcome)
            });
        })
    };

    // Hand the session to the web dashboard through a one-time ticket
    let on_open_dashboard = {
        let services = (*services).clone();
        let token = match &state.view {
            PopupView::Analysis(session) => Some(session.token.clone()),
            _ => None,
        };
        Callback::from(move |_: MouseEvent| {
            let (Some(services), Some(token)) = (services.clone(), token.clone()) else {
                return;
            };
            spawn_local(async move {
                let ticket = match services.auth.api().generate_sso_ticket(&token).await {
                    Ok(ticket) => ticket,
                    Err(e) => {
                        log::error!("No dashboard ticket: {}", e);
                        return;
                    }
                };
                if let Err(e) = browser::open_tab(&services.config.dashboard_handoff_url(&ticket)).await {
                    log::error!("Could not open dashboard: {}", e);
                }
            });
        })
    };

    let busy = state.busy;

    html! {
        <div class="padding-20">
            <h1 class="popup-title">{"Echo Escape"}</h1>

            {match &state.view {
                PopupView::Checking => html! {
                    <Loading message={Some("Checking your session...".to_string())} />
                },
                PopupView::Login => html! {
                    <div class="flex-column-gap">
                        <CredentialsForm heading="Login" submit_label="Login" busy={busy} onsubmit={on_login} />
                        <NoticeBanner notice={state.notice.clone()} />
                        <div class="auth-divider">{"OR"}</div>
                        <Button onclick={on_google} disabled={busy} variant={ButtonVariant::Secondary} block={true}>
                            {"Sign in with Google"}
                        </Button>
                        <button class="pf-v5-c-button pf-m-link pf-m-inline" onclick={on_google_in_tab}>
                            {"Use Google in a new tab"}
                        </button>
                        <p class="auth-switch">
                            {"Don't have an account? "}
                            <button class="pf-v5-c-button pf-m-link pf-m-inline" onclick={on_show_register}>{"Register"}</button>
                        </p>
                        <p class="auth-switch">
                            <button class="pf-v5-c-button pf-m-link pf-m-inline" onclick={on_forgot_password}>{"Forgot Password?"}</button>
                        </p>
                    </div>
                },
                PopupView::Register => html! {
                    <div class="flex-column-gap">
                        <CredentialsForm heading="Register" submit_label="Register" busy={busy} onsubmit={on_register} />
                        <NoticeBanner notice={state.notice.clone()} />
                        <p class="auth-switch">
                            {"Already have an account? "}
                            <button class="pf-v5-c-button pf-m-link pf-m-inline" onclick={on_show_login}>{"Login"}</button>
                        </p>
                    </div>
                },
                PopupView::Analysis(session) => html! {
                    <div class="flex-column-gap">
                        <div class="header">
                            <span>{format!("Welcome, {}!", session.identity)}</span>
                            <button class="pf-v5-c-button pf-m-link pf-m-inline" onclick={on_logout}>{"Logout"}</button>
                        </div>
                        <p>{"Click to analyze the article on the current page."}</p>
                        <Button onclick={on_analyze} disabled={busy} variant={ButtonVariant::Primary} block={true}>
                            {if busy { "Working..." } else { "Analyze Page" }}
                        </Button>
                        <NoticeBanner notice={state.notice.clone()} />

                        if let Some(result) = state.result.clone() {
                            <ResultCard result={result} />
                            <label class="save-toggle">
                                <input type="checkbox" checked={state.save_to_history} onchange={on_toggle_save} />
                                {" Save to history"}
                            </label>
                            <Button onclick={on_save} disabled={busy} variant={ButtonVariant::Secondary} block={true}>
                                {"Save Result"}
                            </Button>
                            <NoticeBanner notice={state.save_notice.clone()} />
                        }

                        <div class="footer-popup">
                            <button class="pf-v5-c-button pf-m-link pf-m-inline" onclick={on_open_dashboard}>
                                {"View Full Dashboard"}
                            </button>
                        </div>
                    </div>
                },
            }}
        </div>
    }
}
