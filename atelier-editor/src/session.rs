/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

use atelier_core::{
    Alignment, ArrangeReport, DesignRecord, Distribution, Element, ElementId, ElementSize, Filters, GridLayout, Point,
    Scene, Selection, ShapeType, Space, TextContent,
};
use atelier_render::{ExportArtifact, Renderer, Resources, probe_dimensions};
use tracing::{debug, info, warn};

use crate::auth::{AuthProvider, ExportGate};
use crate::controller::{Handle, InteractionController, InteractionState, ListenerId, ListenerRegistry, WindowEvent};
use crate::error::SessionError;
use crate::notify::Notice;
use crate::persistence::{DesignStore, FallbackStore, KeyValueStore, LocalCache, StoreLocation};
use crate::profile::PageProfile;
use crate::upload::{UploadService, upload_or_fallback};

/// Out-of-process services a session talks to.
pub struct Collaborators {
    pub store: Box<dyn DesignStore>,
    pub local: Box<dyn KeyValueStore>,
    pub auth: Box<dyn AuthProvider>,
    pub uploads: Box<dyn UploadService>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub subject: String,
}

/// One open design: the scene, what is selected, the pointer state and the
/// services around them. All scene mutation from the page goes through here.
pub struct EditorSession {
    profile: PageProfile,
    scene: Scene,
    selection: Selection,
    controller: InteractionController,
    listeners: ListenerRegistry,
    pointer_up: Option<ListenerId>,
    renderer: Renderer,
    resources: Resources,
    store: FallbackStore<Box<dyn DesignStore>, Box<dyn KeyValueStore>>,
    auth: Box<dyn AuthProvider>,
    uploads: Box<dyn UploadService>,
    export_gate: ExportGate<ExportRequest>,
    notices: Vec<Notice>,
}

impl EditorSession {
    pub fn new(profile: PageProfile, collaborators: Collaborators) -> Result<Self, SessionError> {
        let mut listeners = ListenerRegistry::default();
        let pointer_up = Some(listeners.subscribe(WindowEvent::PointerUp)?);
        let Collaborators { store, local, auth, uploads } = collaborators;

        info!(kind = ?profile.kind, "editor session started");
        Ok(Self {
            scene: profile.new_scene(),
            controller: InteractionController::new(profile.resize, profile.snap),
            profile,
            selection: Selection::new(),
            listeners,
            pointer_up,
            renderer: Renderer::new(),
            resources: Resources::new(),
            store: FallbackStore::new(store, LocalCache::new(local)),
            auth,
            uploads,
            export_gate: ExportGate::default(),
            notices: Vec::new(),
        })
    }

    /// Drops window listeners and any interaction in progress.
    pub fn close(&mut self) {
        if let Some(id) = self.pointer_up.take() {
            self.listeners.unsubscribe(id);
        }
        self.controller.pointer_up();
        debug!("editor session closed");
    }

    pub fn profile(&self) -> &PageProfile {
        &self.profile
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn interaction(&self) -> &InteractionState {
        self.controller.state()
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn set_snap(&mut self, snap: Option<f32>) {
        self.controller.set_snap(snap);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        debug!(%notice, "notice queued");
        self.notices.push(notice);
    }

    /// Makes encoded bytes (template backgrounds, fonts) available to rendering.
    pub fn insert_resource(&mut self, key: impl Into<String>, bytes: Vec<u8>) {
        self.resources.insert(key.into(), bytes);
    }

    fn default_size(&self) -> (Point, ElementSize) {
        let s = self.profile.default_element_size;
        match self.scene.space {
            Space::Percent => (Point::new(50.0, 50.0), ElementSize::percent(s)),
            Space::Pixel => {
                let (cw, ch) = self.scene.canvas_size_f32();
                (
                    Point::new(((cw - s) / 2.0).max(0.0), ((ch - s) / 2.0).max(0.0)),
                    ElementSize::pixels(s, s),
                )
            }
        }
    }

    fn add_selected(&mut self, element: Element) -> ElementId {
        let id = self.scene.add(element);
        self.selection.click(Some(id), false);
        id
    }

    /// Uploads an image and places it in the middle of the canvas. A failed
    /// upload still adds the element with a session-local source.
    pub fn add_image(&mut self, bytes: Vec<u8>, mime: &str) -> Result<ElementId, SessionError> {
        let source = match upload_or_fallback(self.uploads.as_mut(), &bytes, mime) {
            Ok(source) => source,
            Err(e) => {
                self.notify(Notice::error(e.to_string()));
                return Err(e.into());
            }
        };
        if source.is_ephemeral() {
            self.notify(Notice::warning("Upload failed; the image is kept for this session only"));
        }

        let url = source.url().to_string();
        self.resources.insert(url.clone(), bytes);

        let (position, size) = self.default_size();
        let id = self.add_selected(Element::image(position, size).with_source(source));
        self.image_loaded(id, &url);
        Ok(id)
    }

    /// Decode completion for `source`. Applied by identity, and only while the
    /// element still points at that source.
    pub fn image_loaded(&mut self, id: ElementId, source: &str) -> bool {
        let Some(bytes) = self.resources.get(source) else {
            warn!(%id, source, "decoded source has no bytes");
            return false;
        };
        match probe_dimensions(bytes) {
            Ok((w, h)) => self.scene.apply_decoded(id, source, w, h),
            Err(e) => {
                warn!(%id, source, error = %e, "image could not be decoded");
                self.notify(Notice::error("The image could not be read"));
                false
            }
        }
    }

    pub fn add_shape(&mut self, shape_type: ShapeType) -> ElementId {
        let (position, size) = self.default_size();
        self.add_selected(Element::shape(shape_type, position, size))
    }

    pub fn add_text(&mut self, text: impl Into<String>) -> ElementId {
        let (position, size) = self.default_size();
        let content = TextContent::new(text, 32.0);
        self.add_selected(Element::text(content, position, size))
    }

    /// Pointer-down at `point` on a canvas displayed at `rendered` size.
    ///
    /// With a `handle` the primary selection starts resizing. Otherwise the
    /// hit element is selected and starts dragging; pressing on a member of a
    /// multi-selection keeps the group so it can be dragged together.
    pub fn pointer_down(
        &mut self,
        point: Point,
        rendered: (f32, f32),
        modifier: bool,
        handle: Option<Handle>,
    ) -> Option<ElementId> {
        let canvas_point = self.to_canvas(point, rendered);

        if let (Some(handle), Some(primary)) = (handle, self.selection.primary()) {
            self.controller.begin_resize(&self.scene, primary, handle, canvas_point);
            return Some(primary);
        }

        let hit = self.scene.hit_test(point, rendered, &mut self.renderer);
        let keeps_group = hit.is_some_and(|id| !modifier && self.selection.len() > 1 && self.selection.contains(id));
        if !keeps_group {
            self.selection.click(hit, modifier);
        }
        if let Some(id) = hit.filter(|_| !modifier) {
            self.controller.begin_drag(&self.scene, &self.selection, id, canvas_point);
        }
        hit
    }

    pub fn pointer_move(&mut self, point: Point, rendered: (f32, f32)) -> bool {
        let canvas_point = self.to_canvas(point, rendered);
        self.controller.pointer_move(&mut self.scene, canvas_point)
    }

    /// Window-level pointer release, delivered even outside the canvas.
    pub fn window_pointer_up(&mut self) -> bool {
        if !self.listeners.is_subscribed(WindowEvent::PointerUp) {
            return false;
        }
        self.controller.pointer_up()
    }

    fn to_canvas(&self, point: Point, rendered: (f32, f32)) -> Point {
        let (cw, ch) = self.scene.canvas_size_f32();
        let sx = if rendered.0 > 0.0 { cw / rendered.0 } else { 1.0 };
        let sy = if rendered.1 > 0.0 { ch / rendered.1 } else { 1.0 };
        Point::new(point.x * sx, point.y * sy)
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&self.scene);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn with_index(&mut self, id: ElementId, op: impl FnOnce(&mut Scene, usize) -> bool) -> bool {
        match self.scene.index_of(id) {
            Some(i) => op(&mut self.scene, i),
            None => false,
        }
    }

    pub fn raise(&mut self, id: ElementId) -> bool {
        self.with_index(id, Scene::raise)
    }

    pub fn lower(&mut self, id: ElementId) -> bool {
        self.with_index(id, Scene::lower)
    }

    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        self.with_index(id, Scene::bring_to_front)
    }

    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        self.with_index(id, Scene::send_to_back)
    }

    pub fn toggle_visible(&mut self, id: ElementId) -> bool {
        self.with_index(id, Scene::toggle_visible)
    }

    pub fn toggle_locked(&mut self, id: ElementId) -> bool {
        self.with_index(id, Scene::toggle_locked)
    }

    pub fn set_rotation(&mut self, id: ElementId, degrees: f32) -> bool {
        match self.scene.get_mut(id) {
            Some(element) => {
                element.set_rotation(degrees);
                true
            }
            None => false,
        }
    }

    pub fn set_filters(&mut self, id: ElementId, filters: Filters) -> bool {
        match self.scene.get_mut(id).and_then(Element::image_content_mut) {
            Some(img) => {
                img.filters = filters.clamped();
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, id: ElementId) -> Result<(), SessionError> {
        let result = self.scene.remove(id).map(|_| ());
        self.selection.retain_existing(&self.scene);
        self.report(result)
    }

    /// Removes every selected element. Returns how many went.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selection.members().to_vec();
        let removed = ids.into_iter().filter(|id| self.scene.remove(*id).is_ok()).count();
        self.selection.clear();
        removed
    }

    pub fn align(&mut self, alignment: Alignment) -> Result<(), SessionError> {
        let ids = self.selection.members().to_vec();
        let result = self.scene.align(&ids, alignment);
        self.report(result)
    }

    pub fn distribute(&mut self, distribution: Distribution) -> Result<(), SessionError> {
        let ids = self.selection.members().to_vec();
        let result = self.scene.distribute(&ids, distribution);
        self.report(result)
    }

    pub fn arrange(&mut self, layout: &GridLayout) -> Result<ArrangeReport, SessionError> {
        let report = self.scene.arrange_grid(layout);
        let report = self.report(report)?;
        if report.overflow > 0 {
            self.notify(Notice::info(format!(
                "{} element(s) did not fit the {}x{} grid",
                report.overflow, layout.rows, layout.columns
            )));
        }
        Ok(report)
    }

    pub fn resize_canvas(&mut self, width: u32, height: u32, scale_elements: bool) -> Result<(), SessionError> {
        let result = self.scene.resize_canvas(width, height, scale_elements);
        self.report(result)
    }

    fn report<T>(&mut self, result: Result<T, atelier_core::SceneError>) -> Result<T, SessionError> {
        result.map_err(|e| {
            self.notify(Notice::error(e.to_string()));
            e.into()
        })
    }

    pub fn apply_template(&mut self, id: &str) -> Result<(), SessionError> {
        let Some(template) = self.profile.template(id).cloned() else {
            self.notify(Notice::error(format!("Unknown template '{id}'")));
            return Err(SessionError::UnknownTemplate(id.to_string()));
        };
        self.scene.template_id = Some(template.id.clone());
        self.scene.canvas.background_image = template.background_image.clone();
        self.scene.paper = template.paper_config();
        info!(template = %template.id, "template applied");
        Ok(())
    }

    pub fn save(&mut self, name: &str) -> Result<String, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            self.notify(Notice::error("Please enter a design name"));
            return Err(SessionError::EmptyName);
        }

        let payload = self.scene.to_payload();
        match self.store.save(name, &payload) {
            Ok(stored) => {
                self.notify(match stored.location {
                    StoreLocation::Remote => Notice::success("Design saved"),
                    StoreLocation::LocalOnly => Notice::success("Design saved on this device only"),
                });
                Ok(stored.value)
            }
            Err(e) => {
                self.notify(Notice::error(format!("Could not save the design: {e}")));
                Err(e.into())
            }
        }
    }

    pub fn list_designs(&mut self) -> Result<Vec<DesignRecord>, SessionError> {
        match self.store.list() {
            Ok(stored) => Ok(stored.value),
            Err(e) => {
                self.notify(Notice::error(format!("Could not list designs: {e}")));
                Err(e.into())
            }
        }
    }

    /// Replaces the scene with a stored design. Selection and any interaction
    /// in progress are reset.
    pub fn load(&mut self, id: &str) -> Result<(), SessionError> {
        let record = match self.store.load(id) {
            Ok(stored) => stored.value,
            Err(e) => {
                self.notify(Notice::error(format!("Could not load the design: {e}")));
                return Err(e.into());
            }
        };
        let scene = self.report(Scene::from_payload(record.data))?;

        self.scene = scene;
        self.selection.clear();
        self.controller.pointer_up();

        let sourced: Vec<(ElementId, String)> = self
            .scene
            .elements
            .iter()
            .filter_map(|e| Some((e.id, e.image_content()?.source_url()?.to_string())))
            .collect();
        for (element_id, url) in sourced {
            if self.resources.contains_key(&url) {
                self.image_loaded(element_id, &url);
            }
        }

        info!(id, name = %record.name, "design loaded");
        Ok(())
    }

    pub fn delete_design(&mut self, id: &str) -> Result<(), SessionError> {
        match self.store.delete(id) {
            Ok(_) => {
                self.notify(Notice::success("Design deleted"));
                Ok(())
            }
            Err(e) => {
                self.notify(Notice::error(format!("Could not delete the design: {e}")));
                Err(e.into())
            }
        }
    }

    /// Exports the scene. Signed-out users get `Ok(None)` and the export runs
    /// from [`EditorSession::on_authenticated`].
    pub fn export(&mut self) -> Result<Option<ExportArtifact>, SessionError> {
        let request = ExportRequest {
            subject: self.profile.kind.label().to_string(),
        };
        match self.export_gate.request(self.auth.as_ref(), request) {
            Some(request) => self.run_export(&request).map(Some),
            None => {
                self.notify(Notice::info("Sign in to download your design"));
                Ok(None)
            }
        }
    }

    /// Swaps in a new credential source and resumes a deferred export.
    pub fn on_authenticated(&mut self, auth: Box<dyn AuthProvider>) -> Result<Option<ExportArtifact>, SessionError> {
        self.auth = auth;
        match self.export_gate.on_authenticated(self.auth.as_ref()) {
            Some(request) => self.run_export(&request).map(Some),
            None => Ok(None),
        }
    }

    pub fn export_pending(&self) -> bool {
        self.export_gate.is_pending()
    }

    fn run_export(&mut self, request: &ExportRequest) -> Result<ExportArtifact, SessionError> {
        match self.renderer.export(&self.scene, &self.resources, &request.subject) {
            Ok(artifact) => {
                self.notify(Notice::success(format!("Downloaded {}", artifact.file_name)));
                Ok(artifact)
            }
            Err(e) => {
                self.notify(Notice::error(format!("Export failed: {e}")));
                Err(e.into())
            }
        }
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.close();
    }
}
