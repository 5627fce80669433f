//! Command definitions.
//!
//! A [`Command`] is a verb plus an ordered list of string arguments. The
//! typed constructors below cover every verb the server understands; they
//! only stringify arguments, the codec never looks inside them.
//!
//! # Verbs
//!
//! | Group | Verbs |
//! |-------|-------|
//! | Navigation | `Visit`, `Body`, `CurrentUrl`, `Reset`, `Wait` |
//! | HTTP | `Header`, `Status`, `Headers` |
//! | Script | `Evaluate`, `Execute` |
//! | Rendering | `Render` |
//! | Cookies | `SetCookie`, `ClearCookies`, `GetCookies` |
//! | Session | `SetErrorTolerance`, `SetProxy`, `ClearProxy` |
//! | Selection | `FindCss`, `FindXpath` |
//! | Node | `Node <op> <id> [args...]` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::identifiers::NodeId;

// ============================================================================
// Verb
// ============================================================================

/// Top-level command verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Navigate to a URL.
    Visit,
    /// Current DOM as HTML.
    Body,
    /// Current location.
    CurrentUrl,
    /// Set a request header.
    Header,
    /// Clear session state.
    Reset,
    /// Block until the current page load finishes.
    Wait,
    /// HTTP status of the last response.
    Status,
    /// Headers of the last response.
    Headers,
    /// Evaluate an expression and return its JSON value.
    Evaluate,
    /// Execute a script, discarding the result.
    Execute,
    /// Rasterize the page to a file.
    Render,
    /// Add a cookie.
    SetCookie,
    /// Drop all cookies.
    ClearCookies,
    /// List cookies.
    GetCookies,
    /// Toggle server-side error tolerance.
    SetErrorTolerance,
    /// Route requests through a proxy.
    SetProxy,
    /// Stop using a proxy.
    ClearProxy,
    /// Per-node operation.
    Node,
    /// Document-wide CSS query.
    FindCss,
    /// Document-wide XPath query.
    FindXpath,
}

impl Verb {
    /// Returns the wire name of the verb.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Visit => "Visit",
            Self::Body => "Body",
            Self::CurrentUrl => "CurrentUrl",
            Self::Header => "Header",
            Self::Reset => "Reset",
            Self::Wait => "Wait",
            Self::Status => "Status",
            Self::Headers => "Headers",
            Self::Evaluate => "Evaluate",
            Self::Execute => "Execute",
            Self::Render => "Render",
            Self::SetCookie => "SetCookie",
            Self::ClearCookies => "ClearCookies",
            Self::GetCookies => "GetCookies",
            Self::SetErrorTolerance => "SetErrorTolerance",
            Self::SetProxy => "SetProxy",
            Self::ClearProxy => "ClearProxy",
            Self::Node => "Node",
            Self::FindCss => "FindCss",
            Self::FindXpath => "FindXpath",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// NodeOp
// ============================================================================

/// Sub-commands of the `Node` verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeOp {
    /// Inner text.
    Text,
    /// Attribute value.
    Attribute,
    /// Set the node's value (typing into inputs, file inputs, ...).
    Set,
    /// Scalar value.
    Value,
    /// Unique XPath locator.
    Path,
    /// Select an `<option>`.
    SelectOption,
    /// Unselect an `<option>`.
    UnselectOption,
    /// Native left click.
    LeftClick,
    /// Native double click.
    DoubleClick,
    /// Drag onto another node.
    DragTo,
    /// Lower-case tag name.
    TagName,
    /// Visibility check.
    Visible,
    /// Attachment to the live document.
    IsAttached,
    /// CSS query scoped to the node.
    FindCssWithin,
    /// XPath query scoped to the node.
    FindXpathWithin,
}

impl NodeOp {
    /// Returns the wire name of the sub-command.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Attribute => "attribute",
            Self::Set => "set",
            Self::Value => "value",
            Self::Path => "path",
            Self::SelectOption => "selectOption",
            Self::UnselectOption => "unselectOption",
            Self::LeftClick => "leftClick",
            Self::DoubleClick => "doubleClick",
            Self::DragTo => "dragTo",
            Self::TagName => "tagName",
            Self::Visible => "visible",
            Self::IsAttached => "isAttached",
            Self::FindCssWithin => "findCssWithin",
            Self::FindXpathWithin => "findXpathWithin",
        }
    }
}

impl fmt::Display for NodeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Command
// ============================================================================

/// One request frame: a verb and its string arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Verb line.
    pub verb: String,
    /// Arguments, in wire order.
    pub args: Vec<String>,
}

impl Command {
    /// Creates a command without arguments.
    #[inline]
    #[must_use]
    pub fn new(verb: Verb) -> Self {
        Self {
            verb: verb.as_str().to_string(),
            args: Vec::new(),
        }
    }

    /// Creates a command from a raw verb string.
    ///
    /// Used on the decoding side and for verbs a newer server might add.
    #[inline]
    #[must_use]
    pub fn raw(verb: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            verb: verb.into(),
            args,
        }
    }

    /// Appends an argument, stringified with `Display`.
    #[inline]
    #[must_use]
    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Appends several arguments.
    #[inline]
    #[must_use]
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: ToString,
    {
        self.args.extend(args.into_iter().map(|a| a.to_string()));
        self
    }

    /// Builds a `Node <op> <id> [args...]` command.
    #[inline]
    #[must_use]
    pub fn node(op: NodeOp, id: &NodeId) -> Self {
        Self::new(Verb::Node).arg(op.as_str()).arg(id.as_str())
    }
}

// ============================================================================
// Command - Constructors
// ============================================================================

impl Command {
    /// `Visit <url>`
    #[must_use]
    pub fn visit(url: &str) -> Self {
        Self::new(Verb::Visit).arg(url)
    }

    /// `Header <key> <value>`
    #[must_use]
    pub fn header(key: &str, value: &str) -> Self {
        Self::new(Verb::Header).arg(key).arg(value)
    }

    /// `Evaluate <expr>`
    #[must_use]
    pub fn evaluate(expr: &str) -> Self {
        Self::new(Verb::Evaluate).arg(expr)
    }

    /// `Execute <script>`
    #[must_use]
    pub fn execute(script: &str) -> Self {
        Self::new(Verb::Execute).arg(script)
    }

    /// `Render <path> <width> <height>`
    #[must_use]
    pub fn render(path: &str, width: u32, height: u32) -> Self {
        Self::new(Verb::Render).arg(path).arg(width).arg(height)
    }

    /// `SetCookie <cookie>`
    #[must_use]
    pub fn set_cookie(cookie: &str) -> Self {
        Self::new(Verb::SetCookie).arg(cookie)
    }

    /// `SetErrorTolerance true|false`
    #[must_use]
    pub fn set_error_tolerance(tolerant: bool) -> Self {
        Self::new(Verb::SetErrorTolerance).arg(if tolerant { "true" } else { "false" })
    }

    /// `SetProxy <host> <port> <user> <password>`
    #[must_use]
    pub fn set_proxy(host: &str, port: u16, user: &str, password: &str) -> Self {
        Self::new(Verb::SetProxy)
            .arg(host)
            .arg(port)
            .arg(user)
            .arg(password)
    }

    /// `FindCss <selector>`
    #[must_use]
    pub fn find_css(selector: &str) -> Self {
        Self::new(Verb::FindCss).arg(selector)
    }

    /// `FindXpath <expr>`
    #[must_use]
    pub fn find_xpath(expr: &str) -> Self {
        Self::new(Verb::FindXpath).arg(expr)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.verb)?;
        for arg in &self.args {
            write!(f, " {arg:?}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
