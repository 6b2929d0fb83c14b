//! Email and SMS message composition for alerts

use crate::types::{AlertEvent, Priority, Reading};

/// Composes outbound alert text for one container.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    signature: String,
    container_label: String,
}

impl MessageComposer {
    pub fn new(signature: impl Into<String>, container_label: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            container_label: container_label.into(),
        }
    }

    pub fn email_subject(&self, alert: &AlertEvent) -> String {
        format!("[{}] {}", self.container_label, alert.subject)
    }

    pub fn email_body(&self, alert: &AlertEvent) -> String {
        let mut body = format!("{}\n\n{}\n", self.signature, alert.message);
        body.push_str(&format!(
            "\nContainer: {}\nTemperature: {:.1}°C\nTime: {}\n",
            self.container_label,
            alert.temperature,
            alert_time(alert)
        ));
        if let Some(prev) = alert.previous_temperature {
            body.push_str(&format!("Previous reading: {prev:.1}°C\n"));
        }
        if let Some(ref info) = alert.spoilage_info {
            body.push_str(&format!("\nSpoilage outlook: {info}\n"));
        }
        body.push('\n');
        body.push_str(email_closing(alert.priority));
        body
    }

    pub fn sms_body(&self, alert: &AlertEvent) -> String {
        let mut body = format!("{}\n\n{}", self.signature, alert.message);
        if let Some(ref info) = alert.spoilage_info {
            body.push_str("\n\n");
            body.push_str(info);
        }
        body.push_str("\n\n");
        body.push_str(sms_closing(alert.priority));
        body
    }
}

fn alert_time(alert: &AlertEvent) -> String {
    Reading::new(String::new(), alert.timestamp, alert.temperature)
        .datetime()
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

fn email_closing(priority: Priority) -> &'static str {
    match priority {
        Priority::High => {
            "This is a HIGH PRIORITY alert requiring immediate attention to prevent spoilage."
        }
        Priority::Medium => "Please monitor the situation closely.",
        Priority::Low => "No action is required yet. Continue monitoring.",
    }
}

fn sms_closing(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "IMMEDIATE ACTION REQUIRED!",
        Priority::Medium | Priority::Low => "Please monitor the situation closely.",
    }
}

/// Welcome email for a newly provisioned container.
pub fn welcome_email(customer_name: &str, container_id: &str, email: &str, password: &str) -> (String, String) {
    let subject = format!("Welcome - Your Container {container_id} is Ready!");
    let message = format!(
        "Dear {customer_name},\n\n\
         Your container (ID: {container_id}) has been successfully registered.\n\n\
         Email: {email}\n\
         Password: {password}\n\n\
         You can monitor your container's temperature in real-time on the dashboard.\n\n\
         For support, please contact us.\n"
    );
    (subject, message)
}

/// Password reset email.
pub fn password_reset_email(customer_name: &str, email: &str, password: &str) -> (String, String) {
    let subject = "Password Reset".to_string();
    let message = format!(
        "Dear {customer_name},\n\n\
         Your dashboard password has been reset.\n\n\
         Email: {email}\n\
         New password: {password}\n\n\
         If you did not request this change, please contact support.\n"
    );
    (subject, message)
}
