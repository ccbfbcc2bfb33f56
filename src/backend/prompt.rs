//! Credential prompt shown while an agent request is pending.

use std::collections::HashMap;

use tokio::sync::oneshot;

use super::connman::{AgentOwner, CredentialRequest};
use crate::ui::{ElementId, ElementKind, Presenter};

struct PendingPrompt {
    owner: AgentOwner,
    service: String,
    dialog: ElementId,
    fields: Vec<String>,
    response_tx: oneshot::Sender<Option<HashMap<String, String>>>,
}

/// At most one prompt is open; a newer request cancels the older one.
#[derive(Default)]
pub struct PromptBroker {
    pending: Option<PendingPrompt>,
}

impl PromptBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    /// Agent waiting on the open prompt.
    pub fn owner(&self) -> Option<AgentOwner> {
        self.pending.as_ref().map(|p| p.owner)
    }

    /// Service path of the open prompt.
    pub fn service(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.service.as_str())
    }

    pub fn dialog(&self) -> Option<ElementId> {
        self.pending.as_ref().map(|p| p.dialog)
    }

    /// Show one masked field per requested name, titled `title`.
    pub fn open(&mut self, request: CredentialRequest, title: &str, ui: &mut dyn Presenter) {
        if let Some(previous) = self.pending.take() {
            tracing::info!("Replacing credential prompt for {}", previous.service);
            finish(previous, None, ui);
        }

        let dialog = ui.create(
            None,
            None,
            ElementKind::CredentialPrompt {
                service: request.service.clone(),
            },
        );
        ui.set_label(dialog, title);
        for name in &request.fields {
            ui.create(Some(dialog), None, ElementKind::SecretField { name: name.clone() });
        }

        self.pending = Some(PendingPrompt {
            owner: request.owner,
            service: request.service,
            dialog,
            fields: request.fields,
            response_tx: request.response_tx,
        });
    }

    /// Answer with the values of the requested fields.
    pub fn submit(&mut self, mut values: HashMap<String, String>, ui: &mut dyn Presenter) {
        let Some(prompt) = self.pending.take() else {
            tracing::info!("Credentials submitted with no prompt open");
            return;
        };
        values.retain(|name, _| prompt.fields.contains(name));
        finish(prompt, Some(values), ui);
    }

    pub fn cancel(&mut self, ui: &mut dyn Presenter) {
        if let Some(prompt) = self.pending.take() {
            tracing::info!("Canceling credential prompt for {}", prompt.service);
            finish(prompt, None, ui);
        }
    }

    /// Cancel the open prompt only if `owner`'s agent asked for it.
    pub fn cancel_from(&mut self, owner: AgentOwner, ui: &mut dyn Presenter) {
        match self.owner() {
            Some(current) if current == owner => self.cancel(ui),
            Some(current) => {
                tracing::debug!("Ignoring {:?} cancel, prompt belongs to {:?}", owner, current);
            }
            None => {}
        }
    }
}

fn finish(prompt: PendingPrompt, answer: Option<HashMap<String, String>>, ui: &mut dyn Presenter) {
    if prompt.response_tx.send(answer).is_err() {
        tracing::debug!("Agent for {} stopped waiting", prompt.service);
    }
    ui.destroy(prompt.dialog);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::UiModel;

    type Reply = oneshot::Receiver<Option<HashMap<String, String>>>;

    fn request(service: &str, fields: &[&str]) -> (CredentialRequest, Reply) {
        let owner = if service.starts_with("/net/connman/vpn/") {
            AgentOwner::Vpn
        } else {
            AgentOwner::Connman
        };
        let (response_tx, response_rx) = oneshot::channel();
        let request = CredentialRequest {
            owner,
            service: service.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            response_tx,
        };
        (request, response_rx)
    }

    #[test]
    fn open_shows_one_secret_per_field() {
        let mut ui = UiModel::new();
        let mut broker = PromptBroker::new();
        let (req, _reply) = request("/net/connman/service/wifi_home", &["Passphrase"]);
        broker.open(req, "Home", &mut ui);

        let dialog = broker.dialog().unwrap();
        assert_eq!(ui.label(dialog), Some("Home"));
        let fields = ui.children(Some(dialog));
        assert_eq!(fields.len(), 1);
        assert_eq!(ui.label(fields[0]), Some("Passphrase"));
    }

    #[test]
    fn submit_answers_only_requested_fields() {
        let mut ui = UiModel::new();
        let mut broker = PromptBroker::new();
        let (req, mut reply) = request("/net/connman/service/wifi_home", &["Passphrase"]);
        broker.open(req, "Home", &mut ui);

        let values = HashMap::from([
            ("Passphrase".to_string(), "hunter22".to_string()),
            ("Identity".to_string(), "guest".to_string()),
        ]);
        broker.submit(values, &mut ui);

        let answer = reply.try_recv().unwrap().unwrap();
        assert_eq!(answer.len(), 1);
        assert_eq!(answer.get("Passphrase").map(String::as_str), Some("hunter22"));
        assert!(!broker.is_open());
        assert!(ui.is_empty());
    }

    #[test]
    fn cancel_answers_none() {
        let mut ui = UiModel::new();
        let mut broker = PromptBroker::new();
        let (req, mut reply) = request("/net/connman/service/wifi_home", &["Passphrase"]);
        broker.open(req, "Home", &mut ui);
        broker.cancel(&mut ui);
        assert_eq!(reply.try_recv().unwrap(), None);
        assert!(ui.is_empty());
    }

    #[test]
    fn newer_request_cancels_older_prompt() {
        let mut ui = UiModel::new();
        let mut broker = PromptBroker::new();
        let (first, mut first_reply) = request("/net/connman/service/wifi_home", &["Passphrase"]);
        let (second, _second_reply) =
            request("/net/connman/vpn/connection/office", &["Username", "Password"]);

        broker.open(first, "Home", &mut ui);
        broker.open(second, "Office", &mut ui);

        assert_eq!(first_reply.try_recv().unwrap(), None);
        assert_eq!(broker.service(), Some("/net/connman/vpn/connection/office"));
        assert_eq!(ui.find_label("Home").len(), 0);
        assert_eq!(ui.children(broker.dialog()).len(), 2);
    }

    #[test]
    fn abandoned_agent_does_not_break_submit() {
        let mut ui = UiModel::new();
        let mut broker = PromptBroker::new();
        let (req, reply) = request("/net/connman/service/wifi_home", &["Passphrase"]);
        broker.open(req, "Home", &mut ui);
        drop(reply);
        broker.submit(HashMap::new(), &mut ui);
        assert!(!broker.is_open());
    }

    #[test]
    fn other_agent_cannot_cancel_the_prompt() {
        let mut ui = UiModel::new();
        let mut broker = PromptBroker::new();
        let (req, mut reply) = request("/net/connman/service/wifi_home", &["Passphrase"]);
        broker.open(req, "Home", &mut ui);

        broker.cancel_from(AgentOwner::Vpn, &mut ui);
        assert!(broker.is_open());
        assert!(reply.try_recv().is_err());
        assert_eq!(ui.find_label("Home").len(), 1);

        broker.cancel_from(AgentOwner::Connman, &mut ui);
        assert!(!broker.is_open());
        assert_eq!(reply.try_recv().unwrap(), None);
        assert!(ui.is_empty());
    }

    #[test]
    fn vpn_prompt_follows_its_own_agent() {
        let mut ui = UiModel::new();
        let mut broker = PromptBroker::new();
        let (req, mut reply) = request("/net/connman/vpn/connection/office", &["Username"]);
        broker.open(req, "Office", &mut ui);
        assert_eq!(broker.owner(), Some(AgentOwner::Vpn));

        broker.cancel_from(AgentOwner::Connman, &mut ui);
        assert!(broker.is_open());

        broker.cancel_from(AgentOwner::Vpn, &mut ui);
        assert_eq!(reply.try_recv().unwrap(), None);
    }
}
