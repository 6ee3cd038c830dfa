use bevy::asset::LoadState;
use bevy::prelude::*;

/// Plugin that slices loaded images into frame atlases
pub struct SpritesheetPlugin;

impl Plugin for SpritesheetPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, slice_spritesheets_system);
    }
}

/// Image chopped into equally sized frames, row-major.
///
/// Until the image has loaded the sheet is empty (`frame_count == 0`).
/// A failed load keeps it empty for good.
#[derive(Component, Clone, Debug)]
pub struct Spritesheet {
    pub path: String,
    pub image: Handle<Image>,
    pub frame_size: UVec2,
    pub atlas: Option<Handle<TextureAtlas>>,
    pub frame_count: usize,
    pub failed: bool,
}

impl Spritesheet {
    pub fn load(asset_server: &AssetServer, path: &str, frame_size: UVec2) -> Self {
        info!("Loading {}...", path);
        Self {
            path: path.to_string(),
            image: asset_server.load(path.to_string()),
            frame_size,
            atlas: None,
            frame_count: 0,
            failed: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.atlas.is_some()
    }
}

/// Columns and rows of frames in an image. Partial frames at the right and
/// bottom edges count as frames.
pub fn grid_dimensions(image_size: UVec2, frame_size: UVec2) -> (usize, usize) {
    if frame_size.x == 0 || frame_size.y == 0 {
        return (0, 0);
    }
    (
        image_size.x.div_ceil(frame_size.x) as usize,
        image_size.y.div_ceil(frame_size.y) as usize,
    )
}

fn slice_spritesheets_system(
    asset_server: Res<AssetServer>,
    images: Res<Assets<Image>>,
    mut atlases: ResMut<Assets<TextureAtlas>>,
    mut query: Query<(&mut Spritesheet, Option<&mut Handle<TextureAtlas>>)>,
) {
    for (mut sheet, atlas_handle) in query.iter_mut() {
        if sheet.is_ready() || sheet.failed {
            continue;
        }

        if let Some(LoadState::Failed) = asset_server.get_load_state(sheet.image.id()) {
            warn!("Loading {} failed", sheet.path);
            sheet.failed = true;
            continue;
        }

        let Some(image) = images.get(&sheet.image) else {
            continue;
        };

        let size = UVec2::new(
            image.texture_descriptor.size.width,
            image.texture_descriptor.size.height,
        );
        let (columns, rows) = grid_dimensions(size, sheet.frame_size);
        let atlas = TextureAtlas::from_grid(
            sheet.image.clone(),
            sheet.frame_size.as_vec2(),
            columns,
            rows,
            None,
            None,
        );
        let handle = atlases.add(atlas);

        info!("Loaded {} ({} frames)", sheet.path, columns * rows);
        sheet.frame_count = columns * rows;
        sheet.atlas = Some(handle.clone());
        if let Some(mut atlas_handle) = atlas_handle {
            *atlas_handle = handle;
        }
    }
}
