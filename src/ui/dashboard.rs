/// Web dashboard: login, reading-history overview, URL analysis, password reset

use std::rc::Rc;

use yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use patternfly_yew::prelude::*;
use crate::analysis::{AnalysisInput, format_score};
use crate::api::{ApiClient, ReqwestTransport};
use crate::auth::{AuthError, AuthFlow, AuthState, PageLocation, request_password_reset, reset_password};
use crate::browser::{self, BrowserLocation, TabSessionStorage};
use crate::config::Config;
use crate::error::AppError;
use crate::dashboard::{DashboardState, category_choices, create_topic, load_dashboard, move_article};
use crate::inflight::{Generations, InFlight};
use crate::model::{AnalysisResult, Credentials, Session, Topics};
use crate::session::{DASHBOARD_KEYS, SessionStore};
use crate::state::{DashboardAction, DashboardAppState, DashboardView, Notice};
use crate::ui::components::{CredentialsForm, Loading, NoticeBanner, ResultCard, SentimentScore};

type DashboardAuth = AuthFlow<ReqwestTransport, TabSessionStorage>;

#[derive(Clone)]
struct Services {
    auth: Rc<DashboardAuth>,
    config: Rc<Config>,
}

impl Services {
    fn new() -> Services {
        let config = Config::default();
        let api = ApiClient::new(ReqwestTransport::new(&config));
        let sessions = SessionStore::new(TabSessionStorage, DASHBOARD_KEYS);

        Services {
            auth: Rc::new(AuthFlow::new(api, sessions)),
            config: Rc::new(config),
        }
    }
}

impl PartialEq for Services {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.auth, &other.auth)
    }
}

/// A rejected token clears the session and returns to the login form
async fn sign_out_if_unauthorized(
    services: &Services,
    ondispatch: &Callback<DashboardAction>,
    error: &AppError,
) -> bool {
    if !services.auth.end_if_unauthorized(error).await {
        return false;
    }
    ondispatch.emit(DashboardAction::LoggedOut(Some(Notice::error(error.to_string()))));
    true
}

fn input_value(e: &InputEvent) -> Option<String> {
    e.target_dyn_into::<HtmlInputElement>().map(|input| input.value())
}

#[function_component(DashboardApp)]
pub fn dashboard_app() -> Html {
    let state = use_reducer(|| DashboardAppState::at_path(&browser::current_path()));
    let services = use_memo((), |_| Services::new());

    // A ticket in the URL wins over whatever this tab already had
    {
        let dispatcher = state.dispatcher();
        let services = (*services).clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                let auth = &services.auth;
                let outcome = match auth.redeem_sso_ticket(&BrowserLocation).await {
                    Some(redeemed) => redeemed.map(Some),
                    None => auth.resume().await,
                };
                dispatcher.dispatch(DashboardAction::Authenticated(outcome));
            });
            || ()
        });
    }

    let ondispatch = {
        let dispatcher = state.dispatcher();
        Callback::from(move |action: DashboardAction| dispatcher.dispatch(action))
    };

    let navigate = |view: DashboardView| {
        let ondispatch = ondispatch.clone();
        Callback::from(move |_: MouseEvent| ondispatch.emit(DashboardAction::Navigate(view.clone())))
    };

    let on_logout = {
        let ondispatch = ondispatch.clone();
        let services = (*services).clone();
        Callback::from(move |_: MouseEvent| {
            let ondispatch = ondispatch.clone();
            let services = services.clone();
            spawn_local(async move {
                if let Err(e) = services.auth.logout().await {
                    log::error!("Logout failed to clear storage: {}", e);
                }
                ondispatch.emit(DashboardAction::LoggedOut(None));
            });
        })
    };

    let on_delete_account = {
        let ondispatch = ondispatch.clone();
        let services = (*services).clone();
        let session = state.session().cloned();
        Callback::from(move |_: MouseEvent| {
            let Some(session) = session.clone() else {
                return;
            };
            let confirmed = web_sys::window()
                .and_then(|w| {
                    w.confirm_with_message("Delete your account and all saved analyses? This cannot be undone.")
                        .ok()
                })
                .unwrap_or(false);
            if !confirmed {
                return;
            }

            let ondispatch = ondispatch.clone();
            let services = services.clone();
            spawn_local(async move {
                match services.auth.delete_account(&session).await {
                    Ok(message) => ondispatch.emit(DashboardAction::LoggedOut(Some(Notice::success(message)))),
                    Err(e) => {
                        log::error!("Account deletion failed: {}", e);
                        let signed_out = match &e {
                            AuthError::Api(api) => sign_out_if_unauthorized(&services, &ondispatch, api).await,
                            _ => false,
                        };
                        if !signed_out {
                            ondispatch.emit(DashboardAction::Notify(Notice::error(e.to_string())));
                        }
                    }
                }
            });
        })
    };

    if let DashboardView::ResetPassword(token) = &state.view {
        return html! {
            <div class="dashboard-container">
                <ResetPasswordPanel services={(*services).clone()} token={token.clone()} ondispatch={ondispatch.clone()} />
            </div>
        };
    }

    let content = match &state.auth {
        AuthState::Verifying => html! {
            <Loading message={Some("Checking your session...".to_string())} />
        },
        AuthState::LoggedOut => html! {
            <>
                <NoticeBanner notice={state.notice.clone()} />
                <LoginPanel services={(*services).clone()} ondispatch={ondispatch.clone()} />
            </>
        },
        AuthState::LoggedIn(session) => html! {
            <div class="dashboard-card">
                <div class="pf-v5-c-tabs tabs-nav">
                    <ul class="pf-v5-c-tabs__list">
                        <li class={if state.view == DashboardView::Overview { "pf-v5-c-tabs__item pf-m-current" } else { "pf-v5-c-tabs__item" }}>
                            <button class="pf-v5-c-tabs__link" onclick={navigate(DashboardView::Overview)}>
                                <span class="pf-v5-c-tabs__item-text">{"Dashboard"}</span>
                            </button>
                        </li>
                        <li class={if state.view == DashboardView::Analyze { "pf-v5-c-tabs__item pf-m-current" } else { "pf-v5-c-tabs__item" }}>
                            <button class="pf-v5-c-tabs__link" onclick={navigate(DashboardView::Analyze)}>
                                <span class="pf-v5-c-tabs__item-text">{"Analyze"}</span>
                            </button>
                        </li>
                        <li class="pf-v5-c-tabs__item nav-push-right">
                            <button class="pf-v5-c-tabs__link" onclick={on_logout}>
                                <span class="pf-v5-c-tabs__item-text">{"Logout"}</span>
                            </button>
                        </li>
                    </ul>
                </div>

                <NoticeBanner notice={state.notice.clone()} />

                {match &state.view {
                    DashboardView::Analyze => html! {
                        <AnalyzePanel services={(*services).clone()} session={session.clone()} ondispatch={ondispatch.clone()} />
                    },
                    _ => html! {
                        <Overview
                            services={(*services).clone()}
                            session={session.clone()}
                            refresh_key={state.refresh_key}
                            ondispatch={ondispatch.clone()}
                        />
                    },
                }}

                <div class="danger-zone">
                    <Button onclick={on_delete_account} variant={ButtonVariant::Danger}>
                        {"Delete Account"}
                    </Button>
                </div>
            </div>
        },
    };

    html! {
        <div class="dashboard-container">
            {content}
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct LoginPanelProps {
    services: Services,
    ondispatch: Callback<DashboardAction>,
}

#[function_component(LoginPanel)]
fn login_panel(props: &LoginPanelProps) -> Html {
    let registering = use_state(|| false);
    let busy = use_state(|| false);
    let notice = use_state(|| None::<Notice>);
    let in_flight = use_state(InFlight::new);

    let on_submit = {
        let services = props.services.clone();
        let ondispatch = props.ondispatch.clone();
        let registering = registering.clone();
        let busy = busy.clone();
        let notice = notice.clone();
        let in_flight = (*in_flight).clone();
        Callback::from(move |credentials: Credentials| {
            let Some(ticket) = in_flight.start() else {
                return;
            };
            busy.set(true);
            notice.set(None);

            let services = services.clone();
            let ondispatch = ondispatch.clone();
            let registering = registering.clone();
            let busy = busy.clone();
            let notice = notice.clone();
            spawn_local(async move {
                let auth = &services.auth;
                if *registering {
                    let outcome = auth.register(&credentials).await;
                    drop(ticket);
                    busy.set(false);
                    match outcome {
                        Ok(message) => {
                            registering.set(false);
                            notice.set(Some(Notice::success(message)));
                        }
                        Err(e) => notice.set(Some(Notice::error(e.to_string()))),
                    }
                } else {
                    let outcome = auth.login(&credentials).await;
                    drop(ticket);
                    busy.set(false);
                    match outcome {
                        Ok(session) => ondispatch.emit(DashboardAction::Authenticated(Ok(Some(session)))),
                        Err(e) => notice.set(Some(Notice::error(e.to_string()))),
                    }
                }
            });
        })
    };

    let on_toggle_mode = {
        let registering = registering.clone();
        let notice = notice.clone();
        Callback::from(move |_: MouseEvent| {
            registering.set(!*registering);
            notice.set(None);
        })
    };

    let on_forgot = {
        let ondispatch = props.ondispatch.clone();
        Callback::from(move |_: MouseEvent| {
            BrowserLocation.replace("/reset-password");
            ondispatch.emit(DashboardAction::Navigate(DashboardView::ResetPassword(None)));
        })
    };

    let (heading, submit_label) = if *registering { ("Register", "Sign Up") } else { ("Login", "Login") };

    html! {
        <div class="dashboard-card auth-card">
            <CredentialsForm heading={heading} submit_label={submit_label} busy={*busy} onsubmit={on_submit} />
            <NoticeBanner notice={(*notice).clone()} />
            <div class="auth-divider">{"OR"}</div>
            <a class="pf-v5-c-button pf-m-secondary pf-m-block" href={props.services.config.google_login_url("dashboard")}>
                {"Sign in with Google"}
            </a>
            <p class="auth-switch">
                if *registering {
                    {"Have an account? "}
                    <button class="pf-v5-c-button pf-m-link pf-m-inline" onclick={on_toggle_mode}>{"Login"}</button>
                } else {
                    {"Don't have an account? "}
                    <button class="pf-v5-c-button pf-m-link pf-m-inline" onclick={on_toggle_mode}>{"Register"}</button>
                    {" | "}
                    <button class="pf-v5-c-button pf-m-link pf-m-inline" onclick={on_forgot}>{"Forgot Password?"}</button>
                }
            </p>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct OverviewProps {
    services: Services,
    session: Session,
    refresh_key: u64,
    ondispatch: Callback<DashboardAction>,
}

#[function_component(Overview)]
fn overview(props: &OverviewProps) -> Html {
    let data = use_state(|| DashboardState::Loading);
    let topics = use_state(|| None::<Topics>);
    let generations = use_state(Generations::new);
    let expanded = use_state(|| None::<String>);
    let new_topic = use_state(String::new);
    let in_flight = use_state(InFlight::new);
    let writing = use_state(|| false);

    // Full refresh whenever the session or the refresh key changes
    {
        let data = data.clone();
        let topics = topics.clone();
        let generations = (*generations).clone();
        let services = props.services.clone();
        let ondispatch = props.ondispatch.clone();
        let session = props.session.clone();
        use_effect_with((props.session.token.clone(), props.refresh_key), move |_| {
            data.set(DashboardState::Loading);
            let generation = generations.next();

            spawn_local(async move {
                let api = services.auth.api();
                let (loaded, fetched_topics) =
                    futures::join!(load_dashboard(api, &session.token), api.topics(&session.token));

                if !generations.is_current(generation) {
                    log::debug!("Discarding superseded dashboard refresh");
                    return;
                }

                // A revoked token sends the user back to the login form
                if let Err(e) = &loaded {
                    if sign_out_if_unauthorized(&services, &ondispatch, e).await {
                        return;
                    }
                }

                match fetched_topics {
                    Ok(fetched) => topics.set(Some(fetched)),
                    Err(e) => log::warn!("Topics unavailable, using defaults: {}", e),
                }
                data.set(DashboardState::from(loaded));
            });
            || ()
        });
    }

    let on_retry = {
        let ondispatch = props.ondispatch.clone();
        Callback::from(move |_: MouseEvent| ondispatch.emit(DashboardAction::Refresh))
    };

    let on_move = {
        let data = data.clone();
        let generations = (*generations).clone();
        let services = props.services.clone();
        let ondispatch = props.ondispatch.clone();
        let token = props.session.token.clone();
        let in_flight = (*in_flight).clone();
        let writing = writing.clone();
        Callback::from(move |(article_id, new_category): (i64, String)| {
            let Some(ticket) = in_flight.start() else {
                return;
            };
            writing.set(true);

            let data = data.clone();
            let generation = generations.next();
            let generations = generations.clone();
            let services = services.clone();
            let ondispatch = ondispatch.clone();
            let token = token.clone();
            let writing = writing.clone();
            spawn_local(async move {
                let outcome = move_article(services.auth.api(), &token, article_id, &new_category).await;
                drop(ticket);
                writing.set(false);
                match outcome {
                    Ok(snapshot) if generations.is_current(generation) => data.set(DashboardState::Ready(snapshot)),
                    Ok(_) => log::debug!("Discarding superseded dashboard refresh"),
                    Err(e) => {
                        log::error!("Move failed: {}", e);
                        if !sign_out_if_unauthorized(&services, &ondispatch, &e).await {
                            ondispatch.emit(DashboardAction::Notify(Notice::error(e.to_string())));
                            ondispatch.emit(DashboardAction::Refresh);
                        }
                    }
                }
            });
        })
    };

    let on_topic_input = {
        let new_topic = new_topic.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(value) = input_value(&e) {
                new_topic.set(value);
            }
        })
    };

    let on_create_topic = {
        let data = data.clone();
        let topics = topics.clone();
        let generations = (*generations).clone();
        let services = props.services.clone();
        let ondispatch = props.ondispatch.clone();
        let token = props.session.token.clone();
        let new_topic = new_topic.clone();
        let in_flight = (*in_flight).clone();
        let writing = writing.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(ticket) = in_flight.start() else {
                return;
            };
            writing.set(true);

            let name = (*new_topic).clone();
            let data = data.clone();
            let topics = topics.clone();
            let generation = generations.next();
            let generations = generations.clone();
            let services = services.clone();
            let ondispatch = ondispatch.clone();
            let token = token.clone();
            let new_topic = new_topic.clone();
            let writing = writing.clone();
            spawn_local(async move {
                let api = services.auth.api();
                let outcome = create_topic(api, &token, &name).await;
                drop(ticket);
                writing.set(false);
                match outcome {
                    Ok(snapshot) => {
                        new_topic.set(String::new());
                        ondispatch.emit(DashboardAction::Notify(Notice::success("Topic created successfully!")));
                        if let Ok(fetched) = api.topics(&token).await {
                            topics.set(Some(fetched));
                        }
                        if generations.is_current(generation) {
                            data.set(DashboardState::Ready(snapshot));
                        }
                    }
                    Err(e) => {
                        if !sign_out_if_unauthorized(&services, &ondispatch, &e).await {
                            ondispatch.emit(DashboardAction::Notify(Notice::error(e.to_string())));
                        }
                    }
                }
            });
        })
    };

    let snapshot = match &*data {
        DashboardState::Loading => {
            return html! { <Loading message={Some("Loading your dashboard...".to_string())} /> };
        }
        DashboardState::Failed(message) => {
            return html! {
                <div class="message-top-margin">
                    <Alert r#type={AlertType::Danger} title={format!("Error: {}", message)} inline={true}>
                    </Alert>
                    <Button onclick={on_retry} variant={ButtonVariant::Secondary}>{"Retry"}</Button>
                </div>
            };
        }
        DashboardState::Ready(snapshot) => snapshot,
    };

    let choices = category_choices((*topics).as_ref());
    let busy = *writing;

    html! {
        <div class="overview">
            <h2 class="dashboard-title">{"Your Information Diet"}</h2>

            <section class="panel">
                <h3 class="section-title">{"Topic Sentiments"}</h3>
                <div class="add-topic">
                    <input class="pf-v5-c-form-control" placeholder="Topic name" value={(*new_topic).clone()} oninput={on_topic_input} />
                    <Button onclick={on_create_topic} disabled={busy} variant={ButtonVariant::Secondary}>
                        {"+ Add Topic"}
                    </Button>
                </div>
                <table class="pf-v5-c-table pf-m-compact">
                    <thead>
                        <tr>
                            <th>{"Topic"}</th>
                            <th>{"Articles"}</th>
                            <th>{"Avg. Score"}</th>
                            <th>{"Actions"}</th>
                        </tr>
                    </thead>
                    <tbody>
                        {for snapshot.categories.iter().map(|stat| {
                            let is_open = expanded.as_deref() == Some(stat.category.as_str());
                            let on_toggle = {
                                let expanded = expanded.clone();
                                let category = stat.category.clone();
                                Callback::from(move |_: MouseEvent| {
                                    expanded.set(if is_open { None } else { Some(category.clone()) });
                                })
                            };
                            html! {
                                <>
                                    <tr>
                                        <td>{&stat.category}</td>
                                        <td>{stat.article_count}</td>
                                        <td><SentimentScore score={stat.average_sentiment} /></td>
                                        <td>
                                            <Button onclick={on_toggle} variant={ButtonVariant::Secondary}>
                                                {if is_open { "Hide" } else { "View" }}
                                            </Button>
                                        </td>
                                    </tr>
                                    if is_open {
                                        <tr class="category-articles">
                                            <td colspan="4">
                                                {for snapshot.articles_in(&stat.category).into_iter().map(|article| {
                                                    let on_select = {
                                                        let on_move = on_move.clone();
                                                        let article_id = article.id;
                                                        let current = article.category.clone();
                                                        Callback::from(move |e: Event| {
                                                            if let Some(select) = e.target_dyn_into::<HtmlSelectElement>() {
                                                                let chosen = select.value();
                                                                if chosen != current {
                                                                    on_move.emit((article_id, chosen));
                                                                }
                                                            }
                                                        })
                                                    };
                                                    html! {
                                                        <div class="article-row" key={article.id}>
                                                            <a href={article.url.clone()} target="_blank" title={article.title.clone()}>
                                                                {&article.title}
                                                            </a>
                                                            <SentimentScore score={article.sentiment} />
                                                            <select class="pf-v5-c-form-control" disabled={busy} onchange={on_select}>
                                                                {for choices.iter().map(|choice| html! {
                                                                    <option value={choice.clone()} selected={*choice == article.category}>
                                                                        {choice}
                                                                    </option>
                                                                })}
                                                            </select>
                                                        </div>
                                                    }
                                                })}
                                            </td>
                                        </tr>
                                    }
                                </>
                            }
                        })}
                    </tbody>
                </table>
            </section>

            <section class="panel">
                <h3 class="section-title">{"Sources"}</h3>
                <table class="pf-v5-c-table pf-m-compact">
                    <thead>
                        <tr>
                            <th>{"Source"}</th>
                            <th>{"Articles"}</th>
                            <th>{"Avg. Score"}</th>
                        </tr>
                    </thead>
                    <tbody>
                        {for snapshot.sources.iter().map(|source| html! {
                            <tr>
                                <td>{&source.source}</td>
                                <td>{source.article_count}</td>
                                <td><SentimentScore score={source.average_sentiment} /></td>
                            </tr>
                        })}
                    </tbody>
                </table>
            </section>

            <section class="panel">
                <h3 class="section-title">{"Top Keywords"}</h3>
                <ul class="keywords-list">
                    {for snapshot.top_keywords().iter().map(|(keyword, count)| html! {
                        <li class="keyword-pill">{format!("{} ({})", keyword, count)}</li>
                    })}
                </ul>
            </section>

            <section class="panel">
                <h3 class="section-title">{"Sentiment Timeline"}</h3>
                <div class="timeline">
                    {for snapshot.recent_timeline().iter().map(|point| html! {
                        <div class="timeline-point">
                            <span class="timeline-date">{&point.date}</span>
                            <SentimentScore score={point.average_sentiment} />
                            <span class="timeline-count">{format!("{} articles", point.article_count)}</span>
                        </div>
                    })}
                </div>
            </section>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct AnalyzePanelProps {
    services: Services,
    session: Session,
    ondispatch: Callback<DashboardAction>,
}

#[function_component(AnalyzePanel)]
fn analyze_panel(props: &AnalyzePanelProps) -> Html {
    let url = use_state(String::new);
    let result = use_state(|| None::<AnalysisResult>);
    let notice = use_state(|| None::<Notice>);
    let busy = use_state(|| false);
    let in_flight = use_state(InFlight::new);

    let on_url = {
        let url = url.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(value) = input_value(&e) {
                url.set(value);
            }
        })
    };

    let on_analyze = {
        let url = url.clone();
        let result = result.clone();
        let notice = notice.clone();
        let busy = busy.clone();
        let in_flight = (*in_flight).clone();
        let services = props.services.clone();
        let ondispatch = props.ondispatch.clone();
        let token = props.session.token.clone();
        Callback::from(move |_: MouseEvent| {
            let input = AnalysisInput::Url((*url).trim().to_string());
            if let Err(e) = input.validate() {
                notice.set(Some(Notice::error(e.to_string())));
                return;
            }
            let Some(ticket) = in_flight.start() else {
                return;
            };
            busy.set(true);
            notice.set(None);
            result.set(None);

            let result = result.clone();
            let notice = notice.clone();
            let busy = busy.clone();
            let services = services.clone();
            let ondispatch = ondispatch.clone();
            let token = token.clone();
            spawn_local(async move {
                let outcome = services.auth.api().analyze(&input, &token).await;
                drop(ticket);
                busy.set(false);
                match outcome {
                    Ok(analysis) => {
                        log::info!("Analyzed {} ({})", analysis.title, format_score(analysis.sentiment));
                        result.set(Some(analysis));
                        ondispatch.emit(DashboardAction::Refresh);
                    }
                    Err(e) => {
                        log::error!("Analysis failed: {}", e);
                        if !sign_out_if_unauthorized(&services, &ondispatch, &e).await {
                            notice.set(Some(Notice::error(e.to_string())));
                        }
                    }
                }
            });
        })
    };

    html! {
        <div class="analyze-panel">
            <h2>{"Analyze New Article"}</h2>
            <div class="analyze-form">
                <input class="pf-v5-c-form-control" placeholder="https://..." value={(*url).clone()} oninput={on_url} />
                <Button onclick={on_analyze} disabled={*busy} variant={ButtonVariant::Primary}>
                    {if *busy { "Analyzing..." } else { "Analyze" }}
                </Button>
            </div>
            <NoticeBanner notice={(*notice).clone()} />
            if let Some(analysis) = (*result).clone() {
                <ResultCard result={analysis} />
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct ResetPasswordPanelProps {
    services: Services,
    token: Option<String>,
    ondispatch: Callback<DashboardAction>,
}

#[function_component(ResetPasswordPanel)]
fn reset_password_panel(props: &ResetPasswordPanelProps) -> Html {
    let username = use_state(String::new);
    let password = use_state(String::new);
    let confirmation = use_state(String::new);
    let notice = use_state(|| None::<Notice>);
    let busy = use_state(|| false);
    let in_flight = use_state(InFlight::new);

    let bind = |field: &UseStateHandle<String>| {
        let field = field.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(value) = input_value(&e) {
                field.set(value);
            }
        })
    };

    let on_submit = {
        let username = username.clone();
        let password = password.clone();
        let confirmation = confirmation.clone();
        let notice = notice.clone();
        let busy = busy.clone();
        let in_flight = (*in_flight).clone();
        let services = props.services.clone();
        let reset_token = props.token.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(ticket) = in_flight.start() else {
                return;
            };
            busy.set(true);
            notice.set(None);

            let username = (*username).clone();
            let password = (*password).clone();
            let confirmation = (*confirmation).clone();
            let notice = notice.clone();
            let busy = busy.clone();
            let services = services.clone();
            let reset_token = reset_token.clone();
            spawn_local(async move {
                let api = services.auth.api();
                let outcome = match &reset_token {
                    Some(reset_token) => reset_password(api, reset_token, &password, &confirmation).await,
                    None => request_password_reset(api, &username).await,
                };
                drop(ticket);
                busy.set(false);
                notice.set(Some(match outcome {
                    Ok(message) => Notice::success(message),
                    Err(e) => Notice::error(e.to_string()),
                }));
            });
        })
    };

    let on_back = {
        let ondispatch = props.ondispatch.clone();
        Callback::from(move |_: MouseEvent| {
            BrowserLocation.replace("/");
            ondispatch.emit(DashboardAction::Navigate(DashboardView::Overview));
        })
    };

    html! {
        <div class="dashboard-card auth-card">
            <form class="auth-form" onsubmit={on_submit}>
                if props.token.is_some() {
                    <h2>{"Set New Password"}</h2>
                    <input type="password" class="pf-v5-c-form-control" placeholder="New Password"
                        value={(*password).clone()} oninput={bind(&password)} />
                    <input type="password" class="pf-v5-c-form-control" placeholder="Confirm New Password"
                        value={(*confirmation).clone()} oninput={bind(&confirmation)} />
                    <button type="submit" class="pf-v5-c-button pf-m-primary pf-m-block" disabled={*busy}>
                        {"Reset Password"}
                    </button>
                } else {
                    <h2>{"Forgot Password"}</h2>
                    <input class="pf-v5-c-form-control" placeholder="Username"
                        value={(*username).clone()} oninput={bind(&username)} />
                    <button type="submit" class="pf-v5-c-button pf-m-primary pf-m-block" disabled={*busy}>
                        {"Request Reset Link"}
                    </button>
                }
            </form>
            <NoticeBanner notice={(*notice).clone()} />
            <button class="pf-v5-c-button pf-m-link pf-m-inline" onclick={on_back}>{"Back to login"}</button>
        </div>
    }
}
