//! HTML blocks for the results area.

pub mod activation;
pub mod html;
pub mod scattering;
pub mod table;

use crate::config::SessionConfig;
use crate::query::FormSnapshot;
use crate::response::{Response, Section};

use self::html::escape_html;

/// Block for messages that are not calculation results, such as
/// configuration warnings and rejected forms.
pub fn error_block(inner_html: &str) -> String {
    format!("<div class=\"result error\"><hr />\n{inner_html}</div>\n")
}

pub fn message_block(message: &str) -> String {
    error_block(&format!("<pre class=\"error\">{}</pre>\n", escape_html(message)))
}

fn section_failure(what: &str, message: &str) -> String {
    format!(
        "<p>{what} calculation failed with</p><pre>\n{}</pre>\n",
        escape_html(message)
    )
}

/// Renders backend responses with the session's cutoff and decay settings.
#[derive(Debug, Clone, Copy)]
pub struct Renderer<'a> {
    session: &'a SessionConfig,
}

impl<'a> Renderer<'a> {
    pub fn new(session: &'a SessionConfig) -> Self {
        Self { session }
    }

    /// One result block. `form` is the snapshot the query was built from;
    /// the scattering section reads the flux and density text from it.
    pub fn render(&self, response: &Response, form: &FormSnapshot) -> String {
        if !response.success {
            return self.render_failure(response);
        }

        let mut content = String::from("<div class=\"result\"><hr>\n");
        let sample = response.sample.as_ref();

        match &response.activation {
            None => {}
            Some(Section::Failed { error }) => {
                content.push_str(&section_failure("activation", error));
            }
            Some(Section::Done(act)) => {
                content.push_str(&activation::render_activation(act, sample, self.session));
            }
        }

        match &response.scattering {
            None => {}
            Some(Section::Failed { error }) => {
                content.push_str(&section_failure("neutron scattering", error));
            }
            Some(Section::Done(scat)) => {
                if let Some(Section::Failed { error }) = &response.xray_scattering {
                    content.push_str(&section_failure("X-ray scattering", error));
                }
                let xray = response.xray_scattering.as_ref().and_then(Section::done);
                match sample {
                    Some(sample) => content.push_str(&scattering::render_scattering(
                        scat,
                        xray,
                        sample,
                        form,
                        self.session,
                    )),
                    None => content.push_str(&section_failure(
                        "neutron scattering",
                        "response has no sample description",
                    )),
                }
            }
        }

        content.push_str("</div>\n");
        content
    }

    fn render_failure(&self, response: &Response) -> String {
        let errors: String = response
            .failure_entries()
            .iter()
            .map(|(key, message)| {
                format!(
                    "<pre class=\"error\">Error {}: {}</pre>\n",
                    escape_html(key),
                    escape_html(message)
                )
            })
            .collect();
        error_block(&errors)
    }
}
