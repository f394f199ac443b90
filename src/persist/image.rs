//! SVG to PNG rasterization.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree, fontdb};

use crate::error::PersistError;

static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();

/// System fonts, loaded on first use and shared afterwards.
fn fonts() -> Arc<fontdb::Database> {
    FONTS
        .get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            Arc::new(db)
        })
        .clone()
}

/// Rasterize an SVG document to PNG bytes. `target` is only used in errors.
pub fn rasterize(svg: &str, target: &Path) -> Result<Vec<u8>, PersistError> {
    let fail = |reason: String| PersistError::Rasterize {
        path: target.to_path_buf(),
        reason,
    };

    let mut options = Options::default();
    options.fontdb = fonts();
    let tree = Tree::from_str(svg, &options).map_err(|e| fail(e.to_string()))?;

    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| fail(format!("invalid canvas {}x{}", size.width(), size.height())))?;
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());
    pixmap.encode_png().map_err(|e| fail(e.to_string()))
}
