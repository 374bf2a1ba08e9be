//! Camera setup.

use crate::config::GameConfig;
use bevy::prelude::*;

/// Spawn the 2D camera, centered over the play field so the catapult sits
/// near the left edge and the platform band fills the rest of the view.
pub fn setup_camera(mut commands: Commands, config: Res<GameConfig>) {
    let center = Vec3::new(
        config.catapult_x + config.camera_offset_x,
        config.catapult_y + config.camera_offset_y,
        0.0,
    );
    commands.spawn((Camera2d, Transform::from_translation(center)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_centers_at_configured_offset() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        let mut config = GameConfig::default();
        config.camera_offset_x = 100.0;
        config.camera_offset_y = 50.0;
        let origin = config.catapult_origin();
        app.insert_resource(config);
        app.add_systems(Update, setup_camera);
        app.update();

        let world = app.world_mut();
        let tf = *world
            .query_filtered::<&Transform, With<Camera2d>>()
            .single(world)
            .unwrap();
        assert_eq!(tf.translation.x, origin.x + 100.0);
        assert_eq!(tf.translation.y, origin.y + 50.0);
    }
}
