//! Request and response types shared by all backends.
//!
//! The conversation shape follows the Gemini `generateContent` API: a list of
//! turns, each made of parts that carry text, a function call, or a function
//! response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    /// Function results sent back to the model.
    Function,
}

/// A function the model asked to call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

/// The result of a function call, returned to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

/// One part of a turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    /// A text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// A function call part.
    pub fn function_call(name: impl Into<String>, args: Value) -> Self {
        Self {
            function_call: Some(FunctionCall {
                name: name.into(),
                args,
            }),
            ..Self::default()
        }
    }

    /// A function response part.
    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self {
            function_response: Some(FunctionResponse {
                name: name.into(),
                response,
            }),
            ..Self::default()
        }
    }
}

/// One turn of the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A user turn with a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Some(Role::User),
            parts: vec![Part::text(text)],
        }
    }

    /// A model turn with the given parts.
    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Some(Role::Model),
            parts,
        }
    }

    /// A turn returning one function result to the model.
    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self {
            role: Some(Role::Function),
            parts: vec![Part::function_response(name, response)],
        }
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect()
    }

    /// The first function call in this turn, if any.
    pub fn function_call(&self) -> Option<&FunctionCall> {
        self.parts.iter().find_map(|p| p.function_call.as_ref())
    }
}

/// A function the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl FunctionDeclaration {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// A generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Conversation so far, oldest first.
    pub contents: Vec<Content>,
    /// System instruction for the model.
    pub system: Option<String>,
    /// Functions the model may call.
    pub functions: Vec<FunctionDeclaration>,
}

impl GenerateRequest {
    /// A request with a single user prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
            system: None,
            functions: Vec::new(),
        }
    }

    /// Set the system instruction.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Offer functions the model may call.
    pub fn with_functions(mut self, functions: Vec<FunctionDeclaration>) -> Self {
        self.functions = functions;
        self
    }

    /// Append a turn.
    pub fn push(mut self, content: Content) -> Self {
        self.contents.push(content);
        self
    }

    /// Text of the first user turn.
    pub fn prompt(&self) -> String {
        self.contents
            .iter()
            .find(|c| c.role == Some(Role::User))
            .map(Content::text)
            .unwrap_or_default()
    }
}

/// A generation response: the model's turn.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    pub content: Content,
}

impl GenerateResponse {
    /// A response with a single text part.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            content: Content::model(vec![Part::text(text)]),
        }
    }

    /// A response asking for one function call.
    pub fn function_call(name: impl Into<String>, args: Value) -> Self {
        Self {
            content: Content::model(vec![Part::function_call(name, args)]),
        }
    }

    /// Concatenated response text.
    pub fn text(&self) -> String {
        self.content.text()
    }

    /// The function call the model asked for, if any.
    pub fn function_call_request(&self) -> Option<&FunctionCall> {
        self.content.function_call()
    }
}
