use aws_sdk_sesv2::Client as SesClient;
use gallery_atoms::{ActionError, ActionResponse};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::email::send_contact_email;

const MAX_MESSAGE_CHARS: usize = 5000;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ContactReceipt {
    pub message: String,
}

impl ContactRequest {
    pub fn validate(&self) -> Result<(), ActionError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ActionError::Validation(
                "Please provide a valid email address".to_string(),
            ));
        }

        let message = self.message.trim();
        if message.is_empty() {
            return Err(ActionError::Validation("Please provide a message".to_string()));
        }
        if message.chars().count() > MAX_MESSAGE_CHARS {
            return Err(ActionError::Validation(format!(
                "Message must be at most {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        Ok(())
    }
}

/// Handle a contact form submission. Public: no identity is required.
pub async fn submit_contact(
    ses_client: &SesClient,
    config: &Config,
    body: &[u8],
) -> ActionResponse<ContactReceipt> {
    tracing::info!("Contact form submission received");

    let request: ContactRequest = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!("Failed to parse contact request: {}", e);
            return ActionError::Validation(format!("Invalid request body: {}", e)).into();
        }
    };

    if let Err(e) = request.validate() {
        return e.into();
    }

    let (Some(to), Some(from)) = (&config.contact_to_email, &config.contact_from_email) else {
        tracing::error!("Contact form submitted but no contact addresses are configured");
        return ActionError::Unknown("Contact form is not available".to_string()).into();
    };

    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    match send_contact_email(
        ses_client,
        from,
        to,
        request.email.trim(),
        name,
        request.message.trim(),
    )
    .await
    {
        Ok(()) => {
            tracing::info!("Contact email sent successfully from: {}", request.email.trim());
            ActionResponse::success(ContactReceipt {
                message: "Message sent successfully".to_string(),
            })
        }
        Err(e) => {
            tracing::error!("Failed to send contact email: {}", e);
            ActionError::Unknown("Failed to send message. Please try again later.".to_string())
                .into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, message: &str) -> ContactRequest {
        ContactRequest {
            name: None,
            email: email.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn accepts_reasonable_message() {
        assert!(request("ann@example.com", "Do you sell prints?").validate().is_ok());
    }

    #[test]
    fn rejects_bad_email() {
        assert!(matches!(
            request("not-an-email", "hi").validate(),
            Err(ActionError::Validation(_))
        ));
        assert!(matches!(
            request("   ", "hi").validate(),
            Err(ActionError::Validation(_))
        ));
    }

    #[test]
    fn rejects_empty_or_huge_message() {
        assert!(request("a@b.c", "   ").validate().is_err());
        assert!(request("a@b.c", &"x".repeat(MAX_MESSAGE_CHARS + 1))
            .validate()
            .is_err());
    }
}
