// src/session/flows.rs

//! Multi-step protocol flows: login, term selection, message compose.

use url::Url;

use crate::error::{AppError, Result};
use crate::models::OutgoingMessage;

use super::{Session, SessionPayload, StepMethod, StepOutcome};

const LOGIN_PAGE: &str = "login.aspx";
const LANDING_PAGE: &str = "forside.aspx";
const COMPOSE_PAGE: &str = "beskeder2.aspx";

/// Body text present on every page of a signed-in session.
const SIGNED_IN_MARKER: &str = "Log ud";

const LOGIN_EVENT_TARGET: &str = "m$Content$submitbtn2";
const USERNAME_FIELD: &str = "m$Content$username";
const PASSWORD_FIELD: &str = "m$Content$password";

const TERM_FIELD: &str = "s$m$ChooseTerm$term";

const ADD_RECIPIENT_TARGET: &str = "s$m$Content$Content$MessageThreadCtrl$AddRecipientBtn";
const RECIPIENT_FIELD: &str = "s$m$Content$Content$MessageThreadCtrl$RecipientDD";
const ADD_ATTACHMENT_TARGET: &str = "s$m$Content$Content$MessageThreadCtrl$AttachmentBtn";
const ATTACHMENT_FIELD: &str = "s$m$Content$Content$MessageThreadCtrl$AttachmentHF";
const SUBJECT_FIELD: &str = "s$m$Content$Content$MessageThreadCtrl$addForm$subject";
const BODY_FIELD: &str = "s$m$Content$Content$MessageThreadCtrl$addForm$content";
const SEND_TARGET: &str = "s$m$Content$Content$MessageThreadCtrl$addForm$sendBtn";

/// Decide whether a login postback landed a signed-in session. Success
/// redirects to the landing page; the marker guards against a
/// successful-looking URL on an error page.
fn login_succeeded(final_url: &Url, body: &str) -> bool {
    final_url.path().ends_with(LANDING_PAGE) && body.contains(SIGNED_IN_MARKER)
}

impl Session {
    /// Authenticate against the portal.
    ///
    /// Two steps: GET the login page for its hidden state, then POST the
    /// credentials as the submit button's postback. Returns `Ok(false)`
    /// on rejected credentials, `Err(AppError::RateLimited)` when the
    /// block page interposes.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        let first = self
            .step(LOGIN_PAGE, &SessionPayload::new(), StepMethod::Get)
            .await?;
        Self::ensure_not_blocked(&first)?;
        if first.hidden.is_empty() {
            return Err(AppError::session("login", "login page carried no form state"));
        }

        let mut payload = SessionPayload::new();
        payload.merge(&first.hidden);
        payload.insert("__EVENTTARGET", LOGIN_EVENT_TARGET);
        payload.insert("__EVENTARGUMENT", "");
        payload.insert(USERNAME_FIELD, username);
        payload.insert(PASSWORD_FIELD, password);

        let outcome = self.step(LOGIN_PAGE, &payload, StepMethod::Post).await?;
        Self::ensure_not_blocked(&outcome)?;
        Ok(login_succeeded(&outcome.final_url, &outcome.body))
    }

    /// Switch the session's active school term. All subsequent page
    /// fetches render in the selected term.
    pub async fn select_term(&self, term_id: &str) -> Result<()> {
        let current = self
            .step(LANDING_PAGE, &SessionPayload::new(), StepMethod::Get)
            .await?;
        Self::ensure_not_blocked(&current)?;
        if current.hidden.is_empty() {
            return Err(AppError::session(
                "select_term",
                "landing page carried no form state",
            ));
        }

        let mut payload = SessionPayload::new();
        payload.merge(&current.hidden);
        payload.insert("__EVENTTARGET", TERM_FIELD);
        payload.insert("__EVENTARGUMENT", "");
        payload.insert(TERM_FIELD, term_id);

        let outcome = self.step(LANDING_PAGE, &payload, StepMethod::Post).await?;
        Self::ensure_not_blocked(&outcome)?;
        Ok(())
    }

    /// Compose and send a message thread.
    ///
    /// The compose form is itself stateful: each added recipient or
    /// attachment is its own postback whose response carries the state
    /// for the next one, so the additions run strictly in sequence.
    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<()> {
        if message.recipients.is_empty() {
            return Err(AppError::validation("message has no recipients"));
        }

        let mut carried = self
            .step(COMPOSE_PAGE, &SessionPayload::new(), StepMethod::Get)
            .await?;
        Self::check_compose_step(&carried)?;

        for recipient in &message.recipients {
            let mut payload = SessionPayload::new();
            payload.merge(&carried.hidden);
            payload.insert("__EVENTTARGET", ADD_RECIPIENT_TARGET);
            payload.insert("__EVENTARGUMENT", "");
            payload.insert(RECIPIENT_FIELD, recipient.as_str());

            carried = self.step(COMPOSE_PAGE, &payload, StepMethod::Post).await?;
            Self::check_compose_step(&carried)?;
        }

        for attachment in &message.attachments {
            let mut payload = SessionPayload::new();
            payload.merge(&carried.hidden);
            payload.insert("__EVENTTARGET", ADD_ATTACHMENT_TARGET);
            payload.insert("__EVENTARGUMENT", "");
            payload.insert(ATTACHMENT_FIELD, attachment.as_str());

            carried = self.step(COMPOSE_PAGE, &payload, StepMethod::Post).await?;
            Self::check_compose_step(&carried)?;
        }

        let mut payload = SessionPayload::new();
        payload.merge(&carried.hidden);
        payload.insert("__EVENTTARGET", SEND_TARGET);
        payload.insert("__EVENTARGUMENT", "");
        payload.insert(SUBJECT_FIELD, message.subject.as_str());
        payload.insert(BODY_FIELD, message.body.as_str());

        let outcome = self.step(COMPOSE_PAGE, &payload, StepMethod::Post).await?;
        Self::ensure_not_blocked(&outcome)?;

        log::info!(
            "sent message to {} recipient(s): {}",
            message.recipients.len(),
            message.subject
        );
        Ok(())
    }

    fn check_compose_step(outcome: &StepOutcome) -> Result<()> {
        Self::ensure_not_blocked(outcome)?;
        if outcome.hidden.is_empty() {
            return Err(AppError::session(
                "send_message",
                "compose step carried no form state",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn landed_at(path: &str) -> Url {
        Url::parse(&format!("https://www.lectio.dk/lectio/123/{path}")).unwrap()
    }

    #[test]
    fn login_succeeds_on_landing_page_with_signout_link() {
        assert!(login_succeeded(
            &landed_at("forside.aspx"),
            "<div><a href=\"logout.aspx\">Log ud</a></div>"
        ));
    }

    #[test]
    fn login_fails_when_left_on_the_login_page() {
        assert!(!login_succeeded(
            &landed_at("login.aspx"),
            "<div><a href=\"logout.aspx\">Log ud</a></div>"
        ));
    }

    #[test]
    fn login_fails_when_the_signout_link_is_missing() {
        assert!(!login_succeeded(
            &landed_at("forside.aspx"),
            "<div>Der opstod en fejl</div>"
        ));
    }
}
