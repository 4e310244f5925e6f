use eframe::egui;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

// ── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
enum ViewerError {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ── Session ─────────────────────────────────────────────────────────────────

/// The one mutable record of selected paths, current index, and decoded image.
///
/// Rotation and crop replace `current_image` in memory only; nothing is ever
/// written back to disk, so navigating away and back re-decodes the original
/// file and discards the transform.
#[derive(Default)]
struct Session {
    image_paths: Vec<PathBuf>,
    current_index: usize,
    current_image: Option<DynamicImage>,
}

impl Session {
    fn has_image(&self) -> bool {
        self.current_image.is_some()
    }

    fn is_multi(&self) -> bool {
        self.image_paths.len() > 1
    }

    /// Replace the path list wholesale and decode the first entry.
    /// An empty list is ignored; the current gallery stays loaded.
    fn load_paths(&mut self, paths: Vec<PathBuf>) -> Result<(), ViewerError> {
        if paths.is_empty() {
            return Ok(());
        }
        self.image_paths = paths;
        self.current_index = 0;
        self.reload_current()
    }

    fn swipe_previous(&mut self) -> Result<(), ViewerError> {
        if self.image_paths.is_empty() {
            return Ok(());
        }
        self.current_index = if self.current_index == 0 {
            self.image_paths.len() - 1
        } else {
            self.current_index - 1
        };
        self.reload_current()
    }

    fn swipe_next(&mut self) -> Result<(), ViewerError> {
        if self.image_paths.is_empty() {
            return Ok(());
        }
        self.current_index = if self.current_index >= self.image_paths.len() - 1 {
            0
        } else {
            self.current_index + 1
        };
        self.reload_current()
    }

    /// Re-decode the path at `current_index` from disk.
    fn reload_current(&mut self) -> Result<(), ViewerError> {
        let path = &self.image_paths[self.current_index];
        log::debug!("decoding {}", path.display());
        match decode(path) {
            Ok(image) => {
                self.current_image = Some(image);
                Ok(())
            }
            Err(err) => {
                self.current_image = None;
                Err(err)
            }
        }
    }

    /// 90° counter-clockwise, canvas expanded to the new bounding box.
    fn rotate_left(&mut self) {
        self.current_image = self.current_image.as_ref().map(|image| image.rotate270());
    }

    fn rotate_right(&mut self) {
        self.current_image = self.current_image.as_ref().map(|image| image.rotate90());
    }

    /// Crop the current image to `rect`, interpreted directly in pixel space
    /// and intersected with the image bounds. A region that is empty after
    /// intersection leaves the image untouched.
    fn crop(&mut self, rect: CropRect) {
        let Some(image) = self.current_image.as_ref() else {
            return;
        };
        let Some((x, y, width, height)) = rect.pixel_bounds(image.width(), image.height()) else {
            return;
        };
        self.current_image = Some(image.crop_imm(x, y, width, height));
    }
}

fn decode(path: &Path) -> Result<DynamicImage, ViewerError> {
    image::open(path).map_err(|source| ViewerError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

// ── Picking ─────────────────────────────────────────────────────────────────

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Immediate children of `dir` whose extension is on the allow-list.
/// Non-recursive, in enumeration order.
fn list_images(dir: &Path) -> Result<Vec<PathBuf>, ViewerError> {
    let read_dir_err = |source| ViewerError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();
        if is_image_path(&path) {
            paths.push(path);
        }
    }
    Ok(paths)
}

// ── Crop Overlay ────────────────────────────────────────────────────────────

const RESIZE_HANDLE_SIZE: f32 = 20.0;
const DEFAULT_CROP_SIZE: f32 = 300.0;

/// Pointer events delivered by the gesture layer, one variant per kind.
#[derive(Clone, Copy, Debug)]
enum CropGesture {
    /// First move event of an unpositioned box: places the top-left at the
    /// pointer instead of applying a relative move.
    MoveStart { x: f32, y: f32 },
    MoveDelta { dx: f32, dy: f32 },
    ResizeDelta { dx: f32, dy: f32 },
}

/// The drag-resizable rectangle used to define a crop region before commit.
#[derive(Clone, Debug)]
struct CropOverlay {
    visible: bool,
    origin: Option<egui::Pos2>,
    size: egui::Vec2,
}

impl Default for CropOverlay {
    fn default() -> Self {
        Self {
            visible: false,
            origin: None,
            size: egui::Vec2::splat(DEFAULT_CROP_SIZE),
        }
    }
}

impl CropOverlay {
    /// Flip visibility. Showing resets to the default box: the crop tool is
    /// one-shot and does not remember the last-used rectangle.
    fn toggle(&mut self) {
        self.visible = !self.visible;
        if self.visible {
            self.origin = None;
            self.size = egui::Vec2::splat(DEFAULT_CROP_SIZE);
        }
    }

    fn hide(&mut self) {
        self.visible = false;
    }

    fn apply(&mut self, gesture: CropGesture) {
        match gesture {
            CropGesture::MoveStart { x, y } => {
                if self.origin.is_none() {
                    self.origin = Some(egui::pos2(x, y));
                }
            }
            CropGesture::MoveDelta { dx, dy } => {
                if let Some(origin) = &mut self.origin {
                    *origin += egui::vec2(dx, dy);
                }
            }
            CropGesture::ResizeDelta { dx, dy } => {
                // Shrink clamps at the handle size; growth is unclamped and
                // may exceed the displayed image.
                self.size.x = (self.size.x + dx).max(RESIZE_HANDLE_SIZE);
                self.size.y = (self.size.y + dy).max(RESIZE_HANDLE_SIZE);
            }
        }
    }

    /// Geometry in widget-local coordinates; an unseeded origin maps to (0, 0).
    fn crop_rect(&self) -> CropRect {
        let origin = self.origin.unwrap_or(egui::Pos2::ZERO);
        CropRect {
            left: origin.x,
            top: origin.y,
            width: self.size.x,
            height: self.size.y,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct CropRect {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

impl CropRect {
    /// Intersect with the image bounds and convert to pixel coordinates.
    /// Returns `None` when nothing of the rectangle lies over the image.
    fn pixel_bounds(&self, image_width: u32, image_height: u32) -> Option<(u32, u32, u32, u32)> {
        let left = self.left.max(0.0);
        let top = self.top.max(0.0);
        let right = (self.left + self.width).min(image_width as f32);
        let bottom = (self.top + self.height).min(image_height as f32);
        if right <= left || bottom <= top {
            return None;
        }
        Some((
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

// ── Display Frame ───────────────────────────────────────────────────────────

/// Self-contained encoded payload handed to the display surface.
#[derive(Clone)]
struct EncodedFrame {
    uri: String,
    bytes: Arc<[u8]>,
}

fn encode_frame(image: &DynamicImage, revision: u64) -> Result<EncodedFrame, ViewerError> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(EncodedFrame {
        uri: format!("bytes://crop-view/frame-{revision}"),
        bytes: buf.into(),
    })
}

// ── App ─────────────────────────────────────────────────────────────────────

struct ViewerApp {
    session: Session,
    overlay: CropOverlay,
    frame: Option<EncodedFrame>,
    frame_revision: u64,
    notice: Option<String>,
}

impl ViewerApp {
    fn new() -> Self {
        Self {
            session: Session::default(),
            overlay: CropOverlay::default(),
            frame: None,
            frame_revision: 0,
            notice: None,
        }
    }

    /// Project the session onto the display: re-encode the current image
    /// under a fresh revision URI and retire the previous payload.
    fn refresh_frame(&mut self, ctx: &egui::Context) {
        if let Some(old) = self.frame.take() {
            ctx.forget_image(&old.uri);
        }
        let Some(image) = self.session.current_image.as_ref() else {
            return;
        };
        self.frame_revision += 1;
        match encode_frame(image, self.frame_revision) {
            Ok(frame) => self.frame = Some(frame),
            Err(err) => {
                log::error!("{err}");
                self.notice = Some(err.to_string());
            }
        }
    }

    fn note_result(&mut self, result: Result<(), ViewerError>) {
        match result {
            Ok(()) => self.notice = None,
            Err(err) => {
                log::error!("{err}");
                self.notice = Some(err.to_string());
            }
        }
    }

    fn handle_pick_images(&mut self, ctx: &egui::Context) {
        // Dismissing the dialog leaves all prior state untouched.
        let Some(paths) = rfd::FileDialog::new()
            .set_title("Select image")
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_files()
        else {
            return;
        };
        log::info!("picked {} file(s)", paths.len());
        self.apply_pick(paths, ctx);
    }

    fn handle_pick_dir(&mut self, ctx: &egui::Context) {
        let mut dialog = rfd::FileDialog::new().set_title("Select dir");
        if let Ok(initial) = std::env::var("INITIAL_DIR") {
            dialog = dialog.set_directory(initial);
        }
        let Some(dir) = dialog.pick_folder() else {
            return;
        };
        match list_images(&dir) {
            Ok(paths) if paths.is_empty() => {
                log::warn!("no images in {}", dir.display());
                self.notice = Some(format!("No images found in {}", dir.display()));
            }
            Ok(paths) => {
                log::info!("picked {} image(s) from {}", paths.len(), dir.display());
                self.apply_pick(paths, ctx);
            }
            Err(err) => {
                log::error!("{err}");
                self.notice = Some(err.to_string());
            }
        }
    }

    fn apply_pick(&mut self, paths: Vec<PathBuf>, ctx: &egui::Context) {
        let result = self.session.load_paths(paths);
        self.note_result(result);
        self.refresh_frame(ctx);
    }

    fn swipe_previous(&mut self, ctx: &egui::Context) {
        let result = self.session.swipe_previous();
        self.note_result(result);
        self.refresh_frame(ctx);
    }

    fn swipe_next(&mut self, ctx: &egui::Context) {
        let result = self.session.swipe_next();
        self.note_result(result);
        self.refresh_frame(ctx);
    }

    fn rotate_left(&mut self, ctx: &egui::Context) {
        if !self.session.has_image() {
            return;
        }
        self.session.rotate_left();
        self.refresh_frame(ctx);
    }

    fn rotate_right(&mut self, ctx: &egui::Context) {
        if !self.session.has_image() {
            return;
        }
        self.session.rotate_right();
        self.refresh_frame(ctx);
    }

    fn toggle_overlay(&mut self) {
        if !self.session.has_image() {
            return;
        }
        self.overlay.toggle();
    }

    fn commit_crop(&mut self, ctx: &egui::Context) {
        if !self.overlay.visible || !self.session.has_image() {
            return;
        }
        self.session.crop(self.overlay.crop_rect());
        self.overlay.hide();
        self.refresh_frame(ctx);
    }

    fn menu_ui(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open Image").clicked() {
                self.handle_pick_images(ctx);
            }
            if ui.button("Open Dir").clicked() {
                self.handle_pick_dir(ctx);
            }
            // Present in the layout but never wired to a writer.
            ui.add_enabled(self.session.has_image(), egui::Button::new("Save Image"));
        });
    }

    fn tools_ui(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Rotate Left").clicked() {
                self.rotate_left(ctx);
            }
            if ui.selectable_label(self.overlay.visible, "Crop").clicked() {
                self.toggle_overlay();
            }
            if ui.button("Rotate Right").clicked() {
                self.rotate_right(ctx);
            }
        });
    }

    fn viewer_ui(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        if let Some(notice) = self.notice.clone() {
            ui.colored_label(ui.visuals().warn_fg_color, notice);
        }

        let Some(frame) = self.frame.clone() else {
            ui.centered_and_justified(|ui| {
                ui.label(egui::RichText::new("No files selected").size(24.0).weak());
            });
            return;
        };

        let multi = self.session.is_multi();
        ui.horizontal_centered(|ui| {
            let arrow_size = egui::vec2(40.0, ui.available_height());
            if multi && ui.add_sized(arrow_size, egui::Button::new("◀")).clicked() {
                self.swipe_previous(ctx);
            }

            let reserved = if multi {
                arrow_size.x + ui.spacing().item_spacing.x
            } else {
                0.0
            };
            let image_area = egui::vec2(
                (ui.available_width() - reserved).max(0.0),
                ui.available_height(),
            );
            let image_response = ui
                .allocate_ui(image_area, |ui| {
                    ui.centered_and_justified(|ui| {
                        ui.add(egui::Image::from_bytes(
                            frame.uri.clone(),
                            egui::load::Bytes::Shared(frame.bytes.clone()),
                        ))
                    })
                    .inner
                })
                .inner;

            if self.overlay.visible {
                self.crop_overlay_ui(ui, image_response.rect);
            }

            if multi && ui.add_sized(arrow_size, egui::Button::new("▶")).clicked() {
                self.swipe_next(ctx);
            }
        });
    }

    fn crop_overlay_ui(&mut self, ui: &mut egui::Ui, image_rect: egui::Rect) {
        let origin = self.overlay.origin.unwrap_or(egui::Pos2::ZERO);
        let body = egui::Rect::from_min_size(image_rect.min + origin.to_vec2(), self.overlay.size);
        let handle = egui::Rect::from_min_size(
            body.max - egui::Vec2::splat(RESIZE_HANDLE_SIZE),
            egui::Vec2::splat(RESIZE_HANDLE_SIZE),
        );

        // The handle sits on top of the body, so it must be registered last.
        let body_response = ui
            .interact(body, ui.id().with("crop-body"), egui::Sense::drag())
            .on_hover_cursor(egui::CursorIcon::Move);
        let handle_response = ui
            .interact(handle, ui.id().with("crop-handle"), egui::Sense::drag())
            .on_hover_cursor(egui::CursorIcon::ResizeNwSe);

        if handle_response.dragged() {
            let delta = handle_response.drag_delta();
            self.overlay.apply(CropGesture::ResizeDelta {
                dx: delta.x,
                dy: delta.y,
            });
        } else if body_response.dragged() {
            if self.overlay.origin.is_none() {
                // First drag positions the box at the pointer instead of
                // moving it relative to an uninitialized origin.
                if let Some(pointer) = body_response.interact_pointer_pos() {
                    let local = pointer - image_rect.min;
                    self.overlay.apply(CropGesture::MoveStart {
                        x: local.x,
                        y: local.y,
                    });
                }
            } else {
                let delta = body_response.drag_delta();
                self.overlay.apply(CropGesture::MoveDelta {
                    dx: delta.x,
                    dy: delta.y,
                });
            }
        }

        // Repaint with post-gesture geometry so the box tracks the pointer.
        let origin = self.overlay.origin.unwrap_or(egui::Pos2::ZERO);
        let body = egui::Rect::from_min_size(image_rect.min + origin.to_vec2(), self.overlay.size);
        let painter = ui.painter();
        painter.rect_filled(
            body,
            0.0,
            egui::Color32::from_rgba_unmultiplied(69, 90, 100, 80),
        );
        painter.rect_stroke(
            body,
            0.0,
            egui::Stroke::new(1.0, egui::Color32::from_rgb(69, 90, 100)),
            egui::StrokeKind::Middle,
        );
        let corner = body.max;
        let mark = egui::Stroke::new(4.0, egui::Color32::from_rgb(96, 125, 139));
        painter.line_segment(
            [egui::pos2(corner.x, corner.y - RESIZE_HANDLE_SIZE), corner],
            mark,
        );
        painter.line_segment(
            [egui::pos2(corner.x - RESIZE_HANDLE_SIZE, corner.y), corner],
            mark,
        );
    }
}

// ── Input Dispatch ──────────────────────────────────────────────────────────

#[derive(Default)]
struct KeyPresses {
    pick_files: bool,
    pick_dir: bool,
    swipe_previous: bool,
    swipe_next: bool,
    rotate_left: bool,
    rotate_right: bool,
    toggle_crop: bool,
    commit_crop: bool,
}

/// Single-key bindings; chords with command-style modifiers are ignored.
fn read_keys(ctx: &egui::Context) -> KeyPresses {
    ctx.input(|input| {
        if input.modifiers.any() {
            return KeyPresses::default();
        }
        KeyPresses {
            pick_files: input.key_pressed(egui::Key::F),
            pick_dir: input.key_pressed(egui::Key::D),
            swipe_previous: input.key_pressed(egui::Key::ArrowLeft),
            swipe_next: input.key_pressed(egui::Key::ArrowRight),
            rotate_left: input.key_pressed(egui::Key::E),
            rotate_right: input.key_pressed(egui::Key::R),
            toggle_crop: input.key_pressed(egui::Key::C),
            commit_crop: input.key_pressed(egui::Key::Enter),
        }
    })
}

// ── eframe App impl ─────────────────────────────────────────────────────────

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let keys = read_keys(ctx);
        if keys.pick_files {
            self.handle_pick_images(ctx);
        }
        if keys.pick_dir {
            self.handle_pick_dir(ctx);
        }
        if keys.swipe_previous {
            self.swipe_previous(ctx);
        }
        if keys.swipe_next {
            self.swipe_next(ctx);
        }
        if keys.rotate_left {
            self.rotate_left(ctx);
        }
        if keys.rotate_right {
            self.rotate_right(ctx);
        }
        if keys.toggle_crop {
            self.toggle_overlay();
        }
        if keys.commit_crop {
            self.commit_crop(ctx);
        }

        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            self.menu_ui(ctx, ui);
        });

        if self.session.has_image() {
            egui::TopBottomPanel::bottom("tools").show(ctx, |ui| {
                self.tools_ui(ctx, ui);
            });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.viewer_ui(ctx, ui);
        });
    }
}

// ── Main ────────────────────────────────────────────────────────────────────

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Image Viewer"),
        ..Default::default()
    };

    eframe::run_native(
        "Image Viewer",
        options,
        Box::new(|cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(ViewerApp::new()))
        }),
    )
    .expect("Failed to run eframe");
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::fs;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("crop-view-{}-{}", name, std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let image = RgbaImage::from_pixel(width, height, image::Rgba([20, 40, 60, 255]));
        image.save(&path).unwrap();
        path
    }

    fn session_with(paths: Vec<PathBuf>) -> Session {
        let mut session = Session::default();
        session.load_paths(paths).unwrap();
        session
    }

    fn dimensions(session: &Session) -> (u32, u32) {
        let image = session.current_image.as_ref().unwrap();
        (image.width(), image.height())
    }

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        assert!(is_image_path(Path::new("photo.jpg")));
        assert!(is_image_path(Path::new("photo.JPEG")));
        assert!(is_image_path(Path::new("photo.WebP")));
        assert!(!is_image_path(Path::new("notes.txt")));
        assert!(!is_image_path(Path::new("png")));
    }

    #[test]
    fn directory_listing_keeps_only_allow_listed_extensions() {
        let dir = fixture_dir("listing");
        for name in ["a.png", "b.txt", "c.JPG", "d.webp"] {
            fs::write(dir.join(name), b"placeholder").unwrap();
        }

        let mut names: Vec<String> = list_images(&dir)
            .unwrap()
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        assert_eq!(names, ["a.png", "c.JPG", "d.webp"]);
    }

    #[test]
    fn empty_directory_listing_leaves_session_untouched() {
        let empty = fixture_dir("empty-dir");
        let images = fixture_dir("empty-dir-gallery");
        let first = write_png(&images, "one.png", 8, 8);
        let mut session = session_with(vec![first.clone()]);

        let listed = list_images(&empty).unwrap();
        assert!(listed.is_empty());

        // A pick replaces state only on a non-empty result.
        session.load_paths(listed).unwrap();
        assert_eq!(session.image_paths, vec![first]);
        assert!(session.has_image());

        // Follow-up operations stay safe.
        session.swipe_next().unwrap();
        session.rotate_left();
        assert_eq!(session.current_index, 0);
    }

    #[test]
    fn swiping_next_over_the_whole_list_returns_to_start() {
        let dir = fixture_dir("cycle");
        let paths = vec![
            write_png(&dir, "one.png", 4, 4),
            write_png(&dir, "two.png", 4, 4),
            write_png(&dir, "three.png", 4, 4),
        ];
        let mut session = session_with(paths);

        for _ in 0..3 {
            session.swipe_next().unwrap();
        }
        assert_eq!(session.current_index, 0);
    }

    #[test]
    fn swipe_previous_wraps_and_next_returns() {
        let dir = fixture_dir("wrap");
        let paths = vec![
            write_png(&dir, "one.png", 4, 4),
            write_png(&dir, "two.png", 4, 4),
        ];
        let mut session = session_with(paths);

        session.swipe_previous().unwrap();
        assert_eq!(session.current_index, 1);
        session.swipe_next().unwrap();
        assert_eq!(session.current_index, 0);
    }

    #[test]
    fn swiping_an_empty_session_is_a_noop() {
        let mut session = Session::default();
        session.swipe_next().unwrap();
        session.swipe_previous().unwrap();
        assert_eq!(session.current_index, 0);
        assert!(!session.has_image());
    }

    #[test]
    fn four_left_rotations_restore_dimensions() {
        let dir = fixture_dir("rotate-four");
        let mut session = session_with(vec![write_png(&dir, "wide.png", 200, 100)]);

        session.rotate_left();
        assert_eq!(dimensions(&session), (100, 200));
        for _ in 0..3 {
            session.rotate_left();
        }
        assert_eq!(dimensions(&session), (200, 100));
    }

    #[test]
    fn left_then_right_rotation_restores_dimensions() {
        let dir = fixture_dir("rotate-pair");
        let mut session = session_with(vec![write_png(&dir, "wide.png", 60, 30)]);

        session.rotate_left();
        session.rotate_right();
        assert_eq!(dimensions(&session), (60, 30));
    }

    #[test]
    fn rotation_without_an_image_is_a_noop() {
        let mut session = Session::default();
        session.rotate_left();
        session.rotate_right();
        assert!(!session.has_image());
    }

    #[test]
    fn swiping_away_and_back_discards_an_unsaved_rotation() {
        let dir = fixture_dir("discard");
        let paths = vec![
            write_png(&dir, "one.png", 20, 10),
            write_png(&dir, "two.png", 20, 10),
        ];
        let mut session = session_with(paths);

        session.rotate_left();
        assert_eq!(dimensions(&session), (10, 20));

        session.swipe_next().unwrap();
        session.swipe_previous().unwrap();
        assert_eq!(dimensions(&session), (20, 10));
    }

    #[test]
    fn crop_commit_matches_requested_pixel_size() {
        let dir = fixture_dir("crop-exact");
        let mut session = session_with(vec![write_png(&dir, "square.png", 200, 200)]);

        session.crop(CropRect {
            left: 10.0,
            top: 10.0,
            width: 50.0,
            height: 50.0,
        });
        assert_eq!(dimensions(&session), (50, 50));
    }

    #[test]
    fn crop_region_is_intersected_with_image_bounds() {
        let dir = fixture_dir("crop-clamp");
        let mut session = session_with(vec![write_png(&dir, "square.png", 200, 200)]);

        session.crop(CropRect {
            left: -10.0,
            top: 150.0,
            width: 500.0,
            height: 500.0,
        });
        assert_eq!(dimensions(&session), (200, 50));
    }

    #[test]
    fn crop_region_outside_the_image_is_a_noop() {
        let dir = fixture_dir("crop-outside");
        let mut session = session_with(vec![write_png(&dir, "square.png", 200, 200)]);

        session.crop(CropRect {
            left: 300.0,
            top: 300.0,
            width: 50.0,
            height: 50.0,
        });
        assert_eq!(dimensions(&session), (200, 200));
    }

    #[test]
    fn crop_without_an_image_is_a_noop() {
        let mut session = Session::default();
        session.crop(CropRect {
            left: 0.0,
            top: 0.0,
            width: 50.0,
            height: 50.0,
        });
        assert!(!session.has_image());
    }

    #[test]
    fn corrupt_file_surfaces_a_decode_error() {
        let dir = fixture_dir("corrupt");
        let bad = dir.join("bad.png");
        fs::write(&bad, b"not a png").unwrap();

        let mut session = Session::default();
        let err = session.load_paths(vec![bad]).unwrap_err();
        assert!(matches!(err, ViewerError::Decode { .. }));
        assert!(!session.has_image());
        assert_eq!(session.current_index, 0);

        // Navigation stays well-defined afterwards.
        assert!(session.swipe_next().is_err());
        assert_eq!(session.current_index, 0);
    }

    #[test]
    fn first_move_event_seeds_the_origin() {
        let mut overlay = CropOverlay::default();
        overlay.toggle();

        overlay.apply(CropGesture::MoveStart { x: 12.0, y: 34.0 });
        assert_eq!(overlay.origin, Some(egui::pos2(12.0, 34.0)));

        overlay.apply(CropGesture::MoveDelta { dx: 5.0, dy: -4.0 });
        assert_eq!(overlay.origin, Some(egui::pos2(17.0, 30.0)));

        // A seeded box never re-seeds.
        overlay.apply(CropGesture::MoveStart { x: 99.0, y: 99.0 });
        assert_eq!(overlay.origin, Some(egui::pos2(17.0, 30.0)));
    }

    #[test]
    fn resize_clamps_to_the_handle_minimum_but_not_growth() {
        let mut overlay = CropOverlay::default();
        overlay.toggle();

        overlay.apply(CropGesture::ResizeDelta {
            dx: -1000.0,
            dy: -1000.0,
        });
        assert_eq!(overlay.size, egui::Vec2::splat(RESIZE_HANDLE_SIZE));

        overlay.apply(CropGesture::ResizeDelta {
            dx: 480.0,
            dy: 30.0,
        });
        assert_eq!(overlay.size, egui::vec2(500.0, 50.0));
    }

    #[test]
    fn toggling_the_overlay_on_resets_geometry() {
        let mut overlay = CropOverlay::default();
        overlay.toggle();
        overlay.apply(CropGesture::MoveStart { x: 40.0, y: 50.0 });
        overlay.apply(CropGesture::ResizeDelta { dx: 60.0, dy: -10.0 });

        overlay.toggle();
        assert!(!overlay.visible);
        overlay.toggle();
        assert!(overlay.visible);
        assert_eq!(overlay.origin, None);
        assert_eq!(overlay.size, egui::Vec2::splat(DEFAULT_CROP_SIZE));
    }

    #[test]
    fn unseeded_overlay_commits_from_the_widget_origin() {
        let mut overlay = CropOverlay::default();
        overlay.toggle();
        assert_eq!(
            overlay.crop_rect(),
            CropRect {
                left: 0.0,
                top: 0.0,
                width: DEFAULT_CROP_SIZE,
                height: DEFAULT_CROP_SIZE,
            }
        );
    }

    #[test]
    fn frame_revisions_produce_distinct_uris() {
        let image = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
        let first = encode_frame(&image, 1).unwrap();
        let second = encode_frame(&image, 2).unwrap();
        assert_ne!(first.uri, second.uri);
        assert!(!first.bytes.is_empty());
    }
}
