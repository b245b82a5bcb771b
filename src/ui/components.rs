/// Reusable UI components

use yew::prelude::*;
use web_sys::HtmlInputElement;
use patternfly_yew::prelude::*;
use crate::analysis::{Tone, format_score};
use crate::model::{AnalysisResult, Credentials};
use crate::state::{Notice, NoticeKind};

#[derive(Properties, PartialEq)]
pub struct NoticeBannerProps {
    pub notice: Option<Notice>,
}

#[function_component(NoticeBanner)]
pub fn notice_banner(props: &NoticeBannerProps) -> Html {
    let Some(notice) = &props.notice else {
        return html! {};
    };

    let alert_type = match notice.kind {
        NoticeKind::Info => AlertType::Info,
        NoticeKind::Success => AlertType::Success,
        NoticeKind::Error => AlertType::Danger,
    };

    html! {
        <div class="message-top-margin">
            <Alert r#type={alert_type} title={notice.text.clone()} inline={true}>
            </Alert>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SentimentScoreProps {
    pub score: f64,
}

/// Score with two decimals, coloured by tone
#[function_component(SentimentScore)]
pub fn sentiment_score(props: &SentimentScoreProps) -> Html {
    let tone = Tone::of(props.score);

    html! {
        <span class={classes!("sentiment-score", tone.css_class())}>
            {format_score(props.score)}
        </span>
    }
}

#[derive(Properties, PartialEq)]
pub struct ResultCardProps {
    pub result: AnalysisResult,
}

#[function_component(ResultCard)]
pub fn result_card(props: &ResultCardProps) -> Html {
    let result = &props.result;

    html! {
        <div class="results-container">
            <h4 class="result-title">{format!("Analysis for: {}", result.title)}</h4>
            if let Some(author) = &result.author {
                <div class="result-item">
                    <strong>{"Author: "}</strong>{author}
                </div>
            }
            if let Some(publisher) = &result.publisher {
                <div class="result-item">
                    <strong>{"Publisher: "}</strong>{publisher}
                </div>
            }
            if let Some(category) = &result.category {
                <div class="result-item">
                    <strong>{"Category: "}</strong>{category}
                </div>
            }
            <div class="result-item">
                <strong>{"Sentiment Score: "}</strong>
                <SentimentScore score={result.sentiment} />
            </div>
            <div class="result-item">
                <strong>{"Keywords:"}</strong>
                <ul class="keywords-list">
                    {for result.keywords.iter().map(|keyword| html! {
                        <li class="keyword-pill">{keyword}</li>
                    })}
                </ul>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct CredentialsFormProps {
    pub heading: AttrValue,
    pub submit_label: AttrValue,
    pub onsubmit: Callback<Credentials>,
    #[prop_or(false)]
    pub busy: bool,
    #[prop_or(AttrValue::Static("Email"))]
    pub identity_label: AttrValue,
}

/// Email/username + password form shared by login and registration
#[function_component(CredentialsForm)]
pub fn credentials_form(props: &CredentialsFormProps) -> Html {
    let email = use_state(String::new);
    let password = use_state(String::new);

    let on_email = {
        let email = email.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                email.set(input.value());
            }
        })
    };

    let on_password = {
        let password = password.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                password.set(input.value());
            }
        })
    };

    let on_submit = {
        let email = email.clone();
        let password = password.clone();
        let onsubmit = props.onsubmit.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            onsubmit.emit(Credentials {
                email: (*email).clone(),
                password: (*password).clone(),
            });
        })
    };

    html! {
        <form class="auth-form" onsubmit={on_submit}>
            <h3>{props.heading.clone()}</h3>
            <div class="form-group">
                <label for="email">{props.identity_label.clone()}</label>
                <input id="email" class="pf-v5-c-form-control" value={(*email).clone()} oninput={on_email} />
            </div>
            <div class="form-group">
                <label for="password">{"Password"}</label>
                <input id="password" type="password" class="pf-v5-c-form-control" value={(*password).clone()} oninput={on_password} />
            </div>
            <button type="submit" class="pf-v5-c-button pf-m-primary pf-m-block" disabled={props.busy}>
                {if props.busy { AttrValue::from("...") } else { props.submit_label.clone() }}
            </button>
        </form>
    }
}

#[derive(Properties, PartialEq)]
pub struct LoadingProps {
    #[prop_or_default]
    pub message: Option<String>,
}

#[function_component(Loading)]
pub fn loading(props: &LoadingProps) -> Html {
    html! {
        <div class="loading-text-center">
            <Spinner />
            if let Some(msg) = &props.message {
                <p class="loading-text">{msg}</p>
            }
        </div>
    }
}
