use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("failed to build email: {0}")]
    Build(String),

    #[error("SES send_email error: {0}")]
    Send(String),
}

/// Forward a contact form message to the site owner, replying to the sender.
pub async fn send_contact_email(
    ses_client: &SesClient,
    from: &str,
    to: &str,
    sender_email: &str,
    sender_name: Option<&str>,
    message: &str,
) -> Result<(), EmailError> {
    let subject = match sender_name {
        Some(name) => format!("Gallery contact from {} <{}>", name, sender_email),
        None => format!("Gallery contact from {}", sender_email),
    };

    let content = |data: String| {
        Content::builder()
            .data(data)
            .charset("UTF-8")
            .build()
            .map_err(|e| EmailError::Build(e.to_string()))
    };

    let msg = Message::builder()
        .subject(content(subject)?)
        .body(Body::builder().text(content(message.to_string())?).build())
        .build();

    ses_client
        .send_email()
        .from_email_address(from)
        .destination(Destination::builder().to_addresses(to).build())
        .reply_to_addresses(sender_email)
        .content(EmailContent::builder().simple(msg).build())
        .send()
        .await
        .map_err(|e| EmailError::Send(e.to_string()))?;

    Ok(())
}
