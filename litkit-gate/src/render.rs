//! Rendering surface consumed by the gate
//!
//! The gate never draws UI itself. It asks a [`RenderSurface`] for the
//! fallback screens and tracks hard stops on the [`RenderPass`]: once a
//! pass is halted, nothing more reaches the surface.

use std::io::Write;

use tracing::warn;

use crate::error::Collaborator;
use crate::session::Session;

pub const LOGIN_PROMPT: &str = "Please log in to access this content";

pub trait RenderSurface {
    fn render_login_prompt(&mut self);
    fn render_upsell(&mut self, message: &str);
    fn render_error(&mut self, message: &str);
    fn render_setup_instructions(&mut self, collaborator: Collaborator);
    fn render_success(&mut self, message: &str);
    /// Stop emitting output for the rest of the pass
    fn halt(&mut self);
}

/// One sequential page render: a session plus the surface it draws on
pub struct RenderPass<'a> {
    session: &'a mut Session,
    surface: &'a mut dyn RenderSurface,
    halted: bool,
}

impl<'a> RenderPass<'a> {
    pub fn new(session: &'a mut Session, surface: &'a mut dyn RenderSurface) -> Self {
        Self {
            session,
            surface,
            halted: false,
        }
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        self.session
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn login_prompt(&mut self) {
        if !self.halted {
            self.surface.render_login_prompt();
        }
    }

    pub fn upsell(&mut self, message: &str) {
        if !self.halted {
            self.surface.render_upsell(message);
        }
    }

    pub fn error(&mut self, message: &str) {
        if !self.halted {
            self.surface.render_error(message);
        }
    }

    pub fn setup_instructions(&mut self, collaborator: Collaborator) {
        if !self.halted {
            self.surface.render_setup_instructions(collaborator);
        }
    }

    pub fn success(&mut self, message: &str) {
        if !self.halted {
            self.surface.render_success(message);
        }
    }

    /// Hard stop. Session state is left as is.
    pub fn halt(&mut self) {
        if !self.halted {
            self.surface.halt();
            self.halted = true;
        }
    }
}

/// Everything a [`RecordingSurface`] saw, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    LoginPrompt,
    Upsell(String),
    Error(String),
    SetupInstructions(Collaborator),
    Success(String),
    Halt,
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub events: Vec<Rendered>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&Rendered) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn saw_login_prompt(&self) -> bool {
        self.events.contains(&Rendered::LoginPrompt)
    }

    pub fn saw_upsell(&self) -> bool {
        self.events.iter().any(|e| matches!(e, Rendered::Upsell(_)))
    }

    pub fn errors(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Rendered::Error(msg) => Some(msg.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RenderSurface for RecordingSurface {
    fn render_login_prompt(&mut self) {
        self.events.push(Rendered::LoginPrompt);
    }

    fn render_upsell(&mut self, message: &str) {
        self.events.push(Rendered::Upsell(message.to_string()));
    }

    fn render_error(&mut self, message: &str) {
        self.events.push(Rendered::Error(message.to_string()));
    }

    fn render_setup_instructions(&mut self, collaborator: Collaborator) {
        self.events.push(Rendered::SetupInstructions(collaborator));
    }

    fn render_success(&mut self, message: &str) {
        self.events.push(Rendered::Success(message.to_string()));
    }

    fn halt(&mut self) {
        self.events.push(Rendered::Halt);
    }
}

/// Plain-text surface, one line per element
pub struct TextSurface<W: Write> {
    out: W,
}

impl<W: Write> TextSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, tag: &str, text: &str) {
        if let Err(e) = writeln!(self.out, "[{tag}] {text}") {
            warn!(error = %e, "Failed to write render output");
        }
    }
}

impl<W: Write> RenderSurface for TextSurface<W> {
    fn render_login_prompt(&mut self) {
        self.line("login", LOGIN_PROMPT);
    }

    fn render_upsell(&mut self, message: &str) {
        self.line("upsell", message);
    }

    fn render_error(&mut self, message: &str) {
        self.line("error", message);
    }

    fn render_setup_instructions(&mut self, collaborator: Collaborator) {
        for text in collaborator.setup_instructions().lines() {
            self.line("setup", text);
        }
    }

    fn render_success(&mut self, message: &str) {
        self.line("ok", message);
    }

    fn halt(&mut self) {
        self.line("stop", "---");
    }
}
