//! Command names, argument shapes and request framing.
//!
//! Every command's arguments deserialize into a typed struct here; a failed
//! deserialization is the command's validation failure.

use crate::element::ElementId;
use crate::error::{CommandError, CommandResult};
use crate::geometry::{Alignment, Direction};
use crate::scene::Theme;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// A single command as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Every command the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    LoadFromFile,
    SaveToFile,
    ClearScene,
    AddElementsWithMermaid,
    CreateElement,
    UpdateElement,
    DeleteElement,
    QueryElements,
    GetElement,
    GetResource,
    GroupElements,
    UngroupElements,
    AlignElements,
    DistributeElements,
    LockElements,
    UnlockElements,
    SelectElements,
    ClearSelection,
    SetTheme,
    SetViewport,
}

impl CommandName {
    /// All commands, in catalog order.
    pub const ALL: [CommandName; 20] = [
        CommandName::LoadFromFile,
        CommandName::SaveToFile,
        CommandName::ClearScene,
        CommandName::AddElementsWithMermaid,
        CommandName::CreateElement,
        CommandName::UpdateElement,
        CommandName::DeleteElement,
        CommandName::QueryElements,
        CommandName::GetElement,
        CommandName::GetResource,
        CommandName::GroupElements,
        CommandName::UngroupElements,
        CommandName::AlignElements,
        CommandName::DistributeElements,
        CommandName::LockElements,
        CommandName::UnlockElements,
        CommandName::SelectElements,
        CommandName::ClearSelection,
        CommandName::SetTheme,
        CommandName::SetViewport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::LoadFromFile => "load_from_file",
            CommandName::SaveToFile => "save_to_file",
            CommandName::ClearScene => "clear_scene",
            CommandName::AddElementsWithMermaid => "add_elements_with_mermaid",
            CommandName::CreateElement => "create_element",
            CommandName::UpdateElement => "update_element",
            CommandName::DeleteElement => "delete_element",
            CommandName::QueryElements => "query_elements",
            CommandName::GetElement => "get_element",
            CommandName::GetResource => "get_resource",
            CommandName::GroupElements => "group_elements",
            CommandName::UngroupElements => "ungroup_elements",
            CommandName::AlignElements => "align_elements",
            CommandName::DistributeElements => "distribute_elements",
            CommandName::LockElements => "lock_elements",
            CommandName::UnlockElements => "unlock_elements",
            CommandName::SelectElements => "select_elements",
            CommandName::ClearSelection => "clear_selection",
            CommandName::SetTheme => "set_theme",
            CommandName::SetViewport => "set_viewport",
        }
    }
}

impl FromStr for CommandName {
    type Err = CommandError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        CommandName::ALL
            .into_iter()
            .find(|command| command.as_str() == name)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))
    }
}

impl std::fmt::Display for CommandName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Views available through `get_resource`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Scene,
    Library,
    Theme,
    Elements,
}

impl FromStr for ResourceKind {
    type Err = CommandError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "scene" => Ok(ResourceKind::Scene),
            "library" => Ok(ResourceKind::Library),
            "theme" => Ok(ResourceKind::Theme),
            "elements" => Ok(ResourceKind::Elements),
            other => Err(CommandError::UnknownResource(other.to_string())),
        }
    }
}

/// Deserialize a command's argument bag into its declared shape.
///
/// A missing bag is treated as an empty object.
pub fn parse_args<T: DeserializeOwned>(arguments: Value) -> CommandResult<T> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(|e| CommandError::Validation(e.to_string()))
}

/// Take the argument bag as a plain object (for commands whose arguments
/// are element attributes).
pub fn parse_fields(arguments: Value) -> CommandResult<Map<String, Value>> {
    match arguments {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(CommandError::Validation(format!(
            "expected an object of element attributes, got {}",
            other
        ))),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoadFromFileArgs {
    pub data: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveToFileArgs {
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct MermaidArgs {
    pub mermaid: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateElementArgs {
    pub id: ElementId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ElementIdArgs {
    pub id: ElementId,
}

#[derive(Debug, Deserialize)]
pub struct QueryElementsArgs {
    /// Kind name to match; an unrecognized name matches nothing.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub filter: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct GetResourceArgs {
    pub resource: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementIdsArgs {
    pub element_ids: Vec<ElementId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UngroupArgs {
    pub group_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignArgs {
    pub element_ids: Vec<ElementId>,
    pub alignment: Alignment,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributeArgs {
    pub element_ids: Vec<ElementId>,
    pub direction: Direction,
}

#[derive(Debug, Deserialize)]
pub struct SetThemeArgs {
    pub theme: Theme,
}
