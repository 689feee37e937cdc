pub mod camera;
pub mod frame;
pub mod picking;
pub mod spatial;

pub use camera::{orbit_input, setup_scene};
pub use frame::{advance_frame, teardown_on_exit, track_resize};
pub use picking::pick_on_click;
pub use spatial::{draw_edges, sync_scene, SceneEntities};
