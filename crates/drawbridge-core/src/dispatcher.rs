//! Command dispatcher.
//!
//! Owns the element store, group registry and scene state, and is the only
//! place that mutates them. Each command is validated, executed and wrapped
//! into a [`Response`]; failures never escape as anything but an error
//! envelope.

use crate::command::{
    AlignArgs, CommandName, CommandRequest, DistributeArgs, ElementIdArgs, ElementIdsArgs,
    GetResourceArgs, LoadFromFileArgs, MermaidArgs, QueryElementsArgs, ResourceKind,
    SaveToFileArgs, SetThemeArgs, UngroupArgs, UpdateElementArgs, parse_args, parse_fields,
};
use crate::converter::DiagramConverter;
use crate::document::{self, SceneDocument};
use crate::element::{Element, ElementId, ElementKind, new_element_id};
use crate::error::{CommandError, CommandResult};
use crate::geometry;
use crate::groups::GroupRegistry;
use crate::response::Response;
use crate::scene::{SceneState, Viewport};
use crate::storage::ScratchDir;
use crate::store::ElementStore;
use kurbo::{Rect, Vec2};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::sync::Arc;

/// Routes named commands to their handlers.
pub struct Dispatcher {
    store: ElementStore,
    groups: GroupRegistry,
    scene: SceneState,
    scratch: ScratchDir,
    converter: Arc<dyn DiagramConverter>,
}

impl Dispatcher {
    /// Create a dispatcher with an empty scene.
    pub fn new(scratch: ScratchDir, converter: Arc<dyn DiagramConverter>) -> Self {
        Self {
            store: ElementStore::new(),
            groups: GroupRegistry::new(),
            scene: SceneState::new(),
            scratch,
            converter,
        }
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Handle a framed request.
    pub async fn handle(&mut self, request: CommandRequest) -> Response {
        self.dispatch(&request.name, request.arguments).await
    }

    /// Run one command to completion and wrap the outcome.
    pub async fn dispatch(&mut self, name: &str, arguments: Value) -> Response {
        let result = match name.parse::<CommandName>() {
            Ok(command) => self.execute(command, arguments).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(response) => {
                log::debug!("{}: {}", name, response.summary());
                response
            }
            Err(err) => {
                log::warn!("{} failed: {}", name, err);
                Response::error(&err)
            }
        }
    }

    async fn execute(&mut self, command: CommandName, arguments: Value) -> CommandResult<Response> {
        match command {
            CommandName::LoadFromFile => self.load_from_file(parse_args(arguments)?),
            CommandName::SaveToFile => self.save_to_file(parse_args(arguments)?),
            CommandName::ClearScene => Ok(self.clear_scene()),
            CommandName::AddElementsWithMermaid => {
                self.add_elements_with_mermaid(parse_args(arguments)?).await
            }
            CommandName::CreateElement => self.create_element(parse_fields(arguments)?),
            CommandName::UpdateElement => self.update_element(parse_args(arguments)?),
            CommandName::DeleteElement => self.delete_element(parse_args(arguments)?),
            CommandName::QueryElements => self.query_elements(parse_args(arguments)?),
            CommandName::GetElement => self.get_element(parse_args(arguments)?),
            CommandName::GetResource => self.get_resource(parse_args(arguments)?),
            CommandName::GroupElements => self.group_elements(parse_args(arguments)?),
            CommandName::UngroupElements => self.ungroup_elements(parse_args(arguments)?),
            CommandName::AlignElements => self.align_elements(parse_args(arguments)?),
            CommandName::DistributeElements => self.distribute_elements(parse_args(arguments)?),
            CommandName::LockElements => Ok(self.set_locked(parse_args(arguments)?, true)),
            CommandName::UnlockElements => Ok(self.set_locked(parse_args(arguments)?, false)),
            CommandName::SelectElements => Ok(self.select_elements(parse_args(arguments)?)),
            CommandName::ClearSelection => {
                self.scene.clear_selection();
                Ok(Response::text("Selection cleared"))
            }
            CommandName::SetTheme => {
                let args: SetThemeArgs = parse_args(arguments)?;
                self.scene.set_theme(args.theme);
                Ok(Response::text(format!("Theme set to {}", args.theme.as_str())))
            }
            CommandName::SetViewport => {
                let viewport: Viewport = parse_args(arguments)?;
                self.scene.set_viewport(viewport);
                Ok(Response::with_payload("Viewport updated", to_payload(&viewport)?))
            }
        }
    }

    fn load_from_file(&mut self, args: LoadFromFileArgs) -> CommandResult<Response> {
        let text = match (args.data, args.filename) {
            (Some(data), None) => data,
            (None, Some(filename)) => self.scratch.read(&filename)?,
            _ => {
                return Err(CommandError::Validation(
                    "exactly one of `data` or `filename` is required".to_string(),
                ));
            }
        };

        // Nothing is cleared until the document itself parses.
        let decoded = document::decode(&text)?;

        self.store.clear();
        self.groups.clear();
        self.scene.reset();

        let mut skipped = decoded.skipped.len();
        for skip in &decoded.skipped {
            log::warn!("Skipping element at index {}: {}", skip.index, skip.reason);
        }

        let mut loaded = 0;
        for element in decoded.elements {
            let id = element.id.clone();
            match self.store.insert(element) {
                Ok(()) => loaded += 1,
                Err(err) => {
                    log::warn!("Skipping element {}: {}", id, err);
                    skipped += 1;
                }
            }
        }

        if let Some(theme) = decoded.theme {
            self.scene.set_theme(theme);
        }
        if let Some(viewport) = decoded.viewport {
            self.scene.set_viewport(viewport);
        }

        log::info!("Loaded {} element(s), skipped {}", loaded, skipped);
        Ok(Response::with_payload(
            format!("Loaded {} element(s) ({} skipped)", loaded, skipped),
            json!({ "loaded": loaded, "skipped": skipped }),
        ))
    }

    fn save_to_file(&self, args: SaveToFileArgs) -> CommandResult<Response> {
        if args.filename.trim().is_empty() {
            return Err(CommandError::Validation("filename must not be empty".to_string()));
        }

        let document = SceneDocument::from_scene(&self.store, &self.scene);
        let text = document
            .to_json()
            .map_err(|e| CommandError::Serialization(e.to_string()))?;
        let path = self.scratch.write(&args.filename, &text)?;

        log::info!("Saved {} element(s) to {}", document.elements.len(), path.display());
        Ok(Response::with_payload(
            format!("Scene saved to {}", path.display()),
            json!({ "path": path.display().to_string(), "elements": document.elements.len() }),
        ))
    }

    fn clear_scene(&mut self) -> Response {
        let removed = self.store.len();
        self.store.clear();
        self.groups.clear();
        self.scene.reset();
        log::info!("Scene cleared ({} element(s) removed)", removed);
        Response::text(format!("Scene cleared ({} element(s) removed)", removed))
    }

    async fn add_elements_with_mermaid(&mut self, args: MermaidArgs) -> CommandResult<Response> {
        if args.mermaid.trim().is_empty() {
            return Err(CommandError::Validation(
                "mermaid diagram must not be empty".to_string(),
            ));
        }

        let converter = Arc::clone(&self.converter);
        let converted = converter.convert(&args.mermaid).await?;
        for line in &converted.logs {
            log::debug!("converter: {}", line);
        }

        // Validate everything before inserting anything.
        let mut prepared: Vec<Element> = Vec::with_capacity(converted.elements.len());
        let mut claimed: HashSet<ElementId> = HashSet::new();
        for (index, candidate) in converted.elements.into_iter().enumerate() {
            let Value::Object(mut fields) = candidate else {
                return Err(CommandError::Parse(format!(
                    "converter element {} is not an object",
                    index
                )));
            };

            let id = match fields.get("id").and_then(Value::as_str) {
                Some(id) if !id.is_empty() && !self.store.has(id) && !claimed.contains(id) => {
                    id.to_string()
                }
                Some(id) if !id.is_empty() => {
                    log::warn!("Converter id {} already in use, assigning a new one", id);
                    new_element_id()
                }
                _ => new_element_id(),
            };
            fields.insert("id".to_string(), Value::String(id.clone()));

            let element = Element::from_fields(fields).map_err(|e| {
                CommandError::Parse(format!("converter element {} is invalid: {}", index, e))
            })?;
            claimed.insert(id);
            prepared.push(element);
        }

        for element in &prepared {
            self.store.insert(element.clone())?;
        }

        let ids: Vec<&str> = prepared.iter().map(|e| e.id.as_str()).collect();
        let mut response = Response::with_payload(
            format!("Added {} element(s) from mermaid diagram", prepared.len()),
            json!({ "count": prepared.len(), "ids": ids }),
        );
        for element in &prepared {
            response.push(
                format!("{} {}", element.kind, element.id),
                Some(to_payload(element)?),
            );
        }
        log::info!("Imported {} element(s) from mermaid", prepared.len());
        Ok(response)
    }

    fn create_element(&mut self, fields: Map<String, Value>) -> CommandResult<Response> {
        let id = self.store.create(fields)?;
        let element = self
            .store
            .get(&id)
            .ok_or_else(|| CommandError::element_not_found(&id))?;
        Ok(Response::with_payload(
            format!("Created {} element {}", element.kind, id),
            to_payload(element)?,
        ))
    }

    fn update_element(&mut self, args: UpdateElementArgs) -> CommandResult<Response> {
        let element = self.store.update(&args.id, args.fields)?;
        Ok(Response::with_payload(
            format!("Updated element {}", element.id),
            to_payload(&element)?,
        ))
    }

    fn delete_element(&mut self, args: ElementIdArgs) -> CommandResult<Response> {
        let removed = self.store.delete(&args.id)?;
        self.scene.deselect(&removed.id);
        Ok(Response::text(format!("Deleted element {}", removed.id)))
    }

    fn query_elements(&self, args: QueryElementsArgs) -> CommandResult<Response> {
        let kind = match args.kind {
            Some(name) => match serde_json::from_value::<ElementKind>(Value::String(name)) {
                Ok(kind) => Some(kind),
                Err(_) => return Ok(Response::with_payload("Found 0 element(s)", json!([]))),
            },
            None => None,
        };
        let matches = self.store.query(kind, &args.filter)?;
        Ok(Response::with_payload(
            format!("Found {} element(s)", matches.len()),
            to_payload(&matches)?,
        ))
    }

    fn get_element(&self, args: ElementIdArgs) -> CommandResult<Response> {
        let element = self
            .store
            .get(&args.id)
            .ok_or_else(|| CommandError::element_not_found(&args.id))?;
        Ok(Response::with_payload(
            format!("{} element {}", element.kind, element.id),
            to_payload(element)?,
        ))
    }

    fn get_resource(&self, args: GetResourceArgs) -> CommandResult<Response> {
        let kind: ResourceKind = args.resource.parse()?;
        match kind {
            ResourceKind::Scene => Ok(Response::with_payload(
                "Scene state",
                to_payload(&self.scene)?,
            )),
            ResourceKind::Library | ResourceKind::Elements => {
                let elements: Vec<&Element> = self.store.iter().collect();
                Ok(Response::with_payload(
                    format!("{} element(s)", elements.len()),
                    to_payload(&elements)?,
                ))
            }
            ResourceKind::Theme => Ok(Response::with_payload(
                format!("Theme: {}", self.scene.theme.as_str()),
                json!({ "theme": self.scene.theme.as_str() }),
            )),
        }
    }

    fn group_elements(&mut self, args: ElementIdsArgs) -> CommandResult<Response> {
        let missing: Vec<&ElementId> = args
            .element_ids
            .iter()
            .filter(|id| !self.store.has(id))
            .collect();
        if !missing.is_empty() {
            log::debug!("Grouping ids not present in the store: {:?}", missing);
        }

        let count = args.element_ids.len();
        let group_id = self.groups.group(args.element_ids.clone());
        Ok(Response::with_payload(
            format!("Grouped {} element(s) as {}", count, group_id),
            json!({ "groupId": group_id, "elementIds": args.element_ids }),
        ))
    }

    fn ungroup_elements(&mut self, args: UngroupArgs) -> CommandResult<Response> {
        let members = self.groups.ungroup(&args.group_id)?;
        Ok(Response::with_payload(
            format!("Ungrouped {} ({} element(s))", args.group_id, members.len()),
            json!({ "groupId": args.group_id, "elementIds": members }),
        ))
    }

    fn align_elements(&mut self, args: AlignArgs) -> CommandResult<Response> {
        let ids = dedup_ids(args.element_ids);
        let bounds = self.collect_bounds(&ids)?;
        let offsets = geometry::align_offsets(&bounds, args.alignment);
        let moved = self.apply_offsets(&ids, &offsets);
        Ok(Response::with_payload(
            format!(
                "Aligned {} element(s) {} ({} moved)",
                ids.len(),
                args.alignment.as_str(),
                moved
            ),
            json!({ "count": ids.len(), "moved": moved }),
        ))
    }

    fn distribute_elements(&mut self, args: DistributeArgs) -> CommandResult<Response> {
        let ids = dedup_ids(args.element_ids);
        let bounds = self.collect_bounds(&ids)?;
        let offsets = geometry::distribute_offsets(&bounds, args.direction);
        let moved = self.apply_offsets(&ids, &offsets);
        Ok(Response::with_payload(
            format!(
                "Distributed {} element(s) {} ({} moved)",
                ids.len(),
                args.direction.as_str(),
                moved
            ),
            json!({ "count": ids.len(), "moved": moved }),
        ))
    }

    fn set_locked(&mut self, args: ElementIdsArgs, locked: bool) -> Response {
        let touched = self.store.set_locked(&args.element_ids, locked);
        let verb = if locked { "Locked" } else { "Unlocked" };
        Response::with_payload(
            format!("{} {} element(s)", verb, touched),
            json!({ "count": touched, "requested": args.element_ids.len() }),
        )
    }

    fn select_elements(&mut self, args: ElementIdsArgs) -> Response {
        self.scene.select(args.element_ids);
        Response::with_payload(
            format!("Selected {} element(s)", self.scene.selection().len()),
            json!({ "selectedElements": self.scene.selection() }),
        )
    }

    /// Bounding boxes of the given elements; fails if any is missing.
    fn collect_bounds(&self, ids: &[ElementId]) -> CommandResult<Vec<Rect>> {
        ids.iter()
            .map(|id| {
                self.store
                    .get(id)
                    .map(Element::bounds)
                    .ok_or_else(|| CommandError::element_not_found(id))
            })
            .collect()
    }

    /// Translate each element by its offset. Locked elements stay put but
    /// still count toward the reference box. Returns how many moved.
    fn apply_offsets(&mut self, ids: &[ElementId], offsets: &[Vec2]) -> usize {
        let mut moved = 0;
        for (id, offset) in ids.iter().zip(offsets) {
            if *offset == Vec2::ZERO {
                continue;
            }
            if let Some(element) = self.store.get_mut(id).filter(|e| !e.is_locked()) {
                element.translate(*offset);
                moved += 1;
            }
        }
        moved
    }
}

fn dedup_ids(ids: Vec<ElementId>) -> Vec<ElementId> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

fn to_payload<T: Serialize + ?Sized>(value: &T) -> CommandResult<Value> {
    serde_json::to_value(value).map_err(|e| CommandError::Serialization(e.to_string()))
}
