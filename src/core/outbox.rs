//! Notification outbox
//!
//! Delivery is an external concern; MCT renders each notification from
//! its template and drops it into `.mct/outbox/` where a mail relay (or
//! a human) can pick it up.

use rust_embed::RustEmbed;
use std::path::PathBuf;
use tera::Tera;
use thiserror::Error;

use crate::core::project::Project;

/// Embedded notification templates
#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

/// The notification kinds MCT dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    DocumentReleased,
    RevisionReleased,
    EcnSubmitted,
    EcnStatusUpdate,
    EcnImplementation,
}

impl Notification {
    /// Template filename for this notification
    pub fn template(&self) -> &'static str {
        match self {
            Notification::DocumentReleased => "document_released.txt",
            Notification::RevisionReleased => "revision_released.txt",
            Notification::EcnSubmitted => "ecn_submitted.txt",
            Notification::EcnStatusUpdate => "ecn_status_update.txt",
            Notification::EcnImplementation => "ecn_implementation.txt",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Notification::DocumentReleased => "document-released",
            Notification::RevisionReleased => "revision-released",
            Notification::EcnSubmitted => "ecn-submitted",
            Notification::EcnStatusUpdate => "ecn-status-update",
            Notification::EcnImplementation => "ecn-implementation",
        }
    }
}

/// Errors rendering or writing notifications
#[derive(Debug, Error)]
pub enum OutboxError {
    #[error("failed to load notification templates: {0}")]
    Templates(#[source] tera::Error),

    #[error("failed to render notification '{template}': {source}")]
    Render {
        template: String,
        #[source]
        source: tera::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The project notification outbox
pub struct Outbox {
    dir: PathBuf,
    tera: Tera,
}

impl Outbox {
    /// Open the outbox for a project, compiling the embedded templates
    pub fn open(project: &Project) -> Result<Self, OutboxError> {
        let mut tera = Tera::default();
        for name in Templates::iter() {
            if let Some(file) = Templates::get(&name) {
                let contents = String::from_utf8_lossy(file.data.as_ref()).to_string();
                tera.add_raw_template(&name, &contents)
                    .map_err(OutboxError::Templates)?;
            }
        }

        Ok(Self {
            dir: project.outbox_dir(),
            tera,
        })
    }

    /// Render a notification for one recipient and write it to the outbox
    pub fn send(
        &self,
        kind: Notification,
        recipient: &str,
        context: &tera::Context,
    ) -> Result<PathBuf, OutboxError> {
        let mut context = context.clone();
        context.insert("recipient", recipient);

        let body = self
            .tera
            .render(kind.template(), &context)
            .map_err(|e| OutboxError::Render {
                template: kind.template().to_string(),
                source: e,
            })?;

        std::fs::create_dir_all(&self.dir)?;
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let path = self
            .dir
            .join(format!("{}-{}-{}.txt", stamp, kind.slug(), recipient));
        std::fs::write(&path, body)?;
        Ok(path)
    }

    /// Send a notification to every recipient in a distribution list
    pub fn send_all(
        &self,
        kind: Notification,
        recipients: &[String],
        context: &tera::Context,
    ) -> Result<usize, OutboxError> {
        for recipient in recipients {
            self.send(kind, recipient, context)?;
        }
        Ok(recipients.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_send_renders_template_with_context() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let outbox = Outbox::open(&project).unwrap();

        let mut ctx = tera::Context::new();
        ctx.insert("sequence", "DC-0001");
        ctx.insert("title", "Bracket Drawing");
        ctx.insert("released_by", "bwilson");

        let path = outbox
            .send(Notification::DocumentReleased, "jsmith", &ctx)
            .unwrap();
        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("jsmith"));
        assert!(body.contains("DC-0001"));
        assert!(body.contains("bwilson"));
    }

    #[test]
    fn test_send_all_writes_one_file_per_recipient() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let outbox = Outbox::open(&project).unwrap();

        let mut ctx = tera::Context::new();
        ctx.insert("number", "ECN-0007");
        ctx.insert("state", "submitted");

        let recipients = vec!["alice".to_string(), "bob".to_string()];
        let sent = outbox
            .send_all(Notification::EcnSubmitted, &recipients, &ctx)
            .unwrap();
        assert_eq!(sent, 2);

        let files: Vec<_> = std::fs::read_dir(project.outbox_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(files.len(), 2);
    }
}
