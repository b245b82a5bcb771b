/// Landing page of the server-side Google sign-in
///
/// Hands the token from the query string to the background context, which
/// stores the session, then closes itself.

use yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use crate::auth::{PageLocation, oauth_callback_session};
use crate::browser::{self, BrowserLocation, ChromeMessenger};
use crate::messaging::{Destination, Message, MessageTransport};

#[function_component(OAuthCallback)]
pub fn oauth_callback() -> Html {
    let failed = use_state(|| false);

    {
        let failed = failed.clone();
        use_effect_with((), move |_| {
            match oauth_callback_session(&BrowserLocation.href()) {
                Some(session) => spawn_local(async move {
                    let message = Message::LoginSuccess {
                        token: session.token,
                        email: session.identity,
                    };
                    match ChromeMessenger.send(Destination::Runtime, &message).await {
                        Ok(_) => browser::close_window(),
                        Err(e) => {
                            log::error!("Could not hand the session to the extension: {}", e);
                            failed.set(true);
                        }
                    }
                }),
                None => failed.set(true),
            }
            || ()
        });
    }

    html! {
        <div class="padding-20">
            if *failed {
                <h1>{"Authentication failed. Please try again."}</h1>
            } else {
                <p>{"Signing you in..."}</p>
            }
        </div>
    }
}
