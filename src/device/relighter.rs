#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::error::precondition;
use crate::{
    composite, rank, AssetSource, EnvironmentMap, Frame, HaarLayout, ImportancePolicy, Result,
    Scene, Settings,
};
use std::path::Path;

/// Relighting state for one display.
///
/// The scene is shared and read-only. The environment is owned by the
/// relighter and only ever replaced as a whole, so a frame never observes a
/// partially loaded map.
#[derive(Debug)]
pub struct Relighter {
    settings: Settings,
    layout: Option<HaarLayout>,
    scene: Scene,
    environment: EnvironmentMap,
}

impl Relighter {
    pub fn new(settings: Settings, scene: Scene, environment: EnvironmentMap) -> Result<Self> {
        let layout = settings.validate()?;

        check_scene(&settings, layout, &scene)?;
        check_environment(&settings, &environment)?;

        let mut relighter = Self {
            settings,
            layout,
            scene,
            environment,
        };

        let top_k = relighter.settings.top_k;
        relighter.set_top_k(top_k);

        info!(
            "relighting {} basis terms ({:?} basis, {:?} policy)",
            relighter.settings.basis_count(),
            relighter.settings.basis,
            relighter.settings.policy
        );

        Ok(relighter)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn environment(&self) -> &EnvironmentMap {
        &self.environment
    }

    /// Swaps in a freshly built scene.
    pub fn set_scene(&mut self, scene: Scene) -> Result<()> {
        check_scene(&self.settings, self.layout, &scene)?;
        self.scene = scene;

        Ok(())
    }

    /// Replaces the environment with a validated map.
    pub fn set_environment(&mut self, environment: EnvironmentMap) -> Result<()> {
        check_environment(&self.settings, &environment)?;
        self.environment = environment;

        Ok(())
    }

    /// Loads environment `name` and switches to it.
    ///
    /// On failure the current environment is left untouched.
    pub fn load_environment(
        &mut self,
        assets: &dyn AssetSource,
        root: &Path,
        name: &str,
    ) -> Result<()> {
        let environment = EnvironmentMap::load(assets, root, name, &self.settings)?;
        self.set_environment(environment)
    }

    pub fn rotate_environment(&mut self, rows: isize) {
        self.environment.rotate(rows);
    }

    pub fn set_importance_policy(&mut self, policy: ImportancePolicy) {
        if self.settings.policy != policy {
            info!("switching to {:?} importance", policy);
        }

        self.settings.policy = policy;
    }

    /// Sets the number of terms summed per frame and returns the clamped value.
    pub fn set_top_k(&mut self, top_k: usize) -> usize {
        let clamped = self.settings.clamp_top_k(top_k);

        if clamped != top_k {
            warn!("clamped top_k {} to {}", top_k, clamped);
        }

        self.settings.top_k = clamped;
        clamped
    }

    /// Ranks the current lighting and composites the frame.
    pub fn render_frame(&self) -> Result<Frame> {
        let ranked = rank(
            &self.environment,
            &self.scene.mean_response,
            self.settings.policy,
            self.layout,
        )?;

        composite(&self.scene.transport, &ranked, self.settings.top_k)
    }
}

fn check_scene(settings: &Settings, layout: Option<HaarLayout>, scene: &Scene) -> Result<()> {
    let expected = settings.basis_count();

    if scene.layout != layout {
        return precondition(format!(
            "scene transport is in {:?} layout, settings expect {:?}",
            scene.layout, layout
        ));
    }

    if scene.transport.basis_count() != expected || scene.mean_response.basis_count() != expected {
        return precondition(format!(
            "scene has {} basis terms, settings expect {}",
            scene.transport.basis_count(),
            expected
        ));
    }

    Ok(())
}

fn check_environment(settings: &Settings, environment: &EnvironmentMap) -> Result<()> {
    if environment.faces() != settings.faces
        || environment.resolution() != settings.environment_resolution
    {
        return precondition(format!(
            "environment has {} faces of {}, settings expect {} faces of {}",
            environment.faces(),
            environment.resolution(),
            settings.faces,
            settings.environment_resolution
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Basis, MemoryAssets, Rgba8Image, TransportMatrix, CHANNELS};

    fn settings() -> Settings {
        Settings {
            faces: 1,
            environment_resolution: 2,
            basis: Basis::Pixel,
            policy: ImportancePolicy::Naive,
            top_k: 2,
            ..Settings::default()
        }
    }

    fn scene() -> Scene {
        let mut data = vec![];

        for _ in 0..CHANNELS {
            data.extend_from_slice(&[0.2, 0.4, 0.1, 0.3]);
        }

        Scene::from_transport(TransportMatrix::from_data(1, 1, 4, data).unwrap(), None)
    }

    fn environment(values: [f32; 4]) -> EnvironmentMap {
        EnvironmentMap::new(2, 1, [values.to_vec(), values.to_vec(), values.to_vec()]).unwrap()
    }

    #[test]
    fn renders_the_scenario_frame() {
        let relighter =
            Relighter::new(settings(), scene(), environment([1.0, 0.5, 0.0, 0.25])).unwrap();

        let frame = relighter.render_frame().unwrap();
        assert_eq!(frame.pixels, vec![41, 41, 41]);
    }

    #[test]
    fn top_k_is_clamped_to_the_basis() {
        let mut relighter =
            Relighter::new(settings(), scene(), environment([1.0, 0.5, 0.0, 0.25])).unwrap();

        assert_eq!(relighter.set_top_k(0), 1);
        assert_eq!(relighter.set_top_k(3), 3);
        assert_eq!(relighter.set_top_k(99), 4);
        assert_eq!(relighter.settings().top_k, 4);
    }

    #[test]
    fn rotation_changes_the_frame() {
        let mut relighter =
            Relighter::new(settings(), scene(), environment([1.0, 0.0, 0.0, 0.0])).unwrap();

        let before = relighter.render_frame().unwrap();
        relighter.rotate_environment(1);
        let after = relighter.render_frame().unwrap();
        relighter.rotate_environment(-1);

        assert_ne!(before.pixels, after.pixels);
        assert_eq!(relighter.render_frame().unwrap().pixels, before.pixels);
    }

    #[test]
    fn failed_environment_load_keeps_the_current_map() {
        let original = environment([1.0, 0.5, 0.0, 0.25]);
        let mut relighter = Relighter::new(settings(), scene(), original.clone()).unwrap();

        let assets = MemoryAssets::new();
        assert!(relighter
            .load_environment(&assets, Path::new("envs"), "sky")
            .is_err());
        assert_eq!(relighter.environment(), &original);
    }

    #[test]
    fn loads_a_new_environment() {
        let mut relighter =
            Relighter::new(settings(), scene(), environment([1.0, 0.5, 0.0, 0.25])).unwrap();

        let mut assets = MemoryAssets::new();
        assets.insert("envs/sky/sky0.png", Rgba8Image::from_fn(4, 4, |_, _| [1.0; 3]));

        relighter
            .load_environment(&assets, Path::new("envs"), "sky")
            .unwrap();

        assert!(relighter.environment().channel(0).iter().all(|&t| t == 1.0));
    }

    #[test]
    fn rejects_mismatched_state() {
        assert!(Relighter::new(
            Settings {
                faces: 2,
                ..settings()
            },
            scene(),
            environment([0.0; 4])
        )
        .is_err());

        let mut relighter = Relighter::new(settings(), scene(), environment([0.0; 4])).unwrap();
        let wide = EnvironmentMap::new(1, 4, [vec![0.0; 4], vec![0.0; 4], vec![0.0; 4]]).unwrap();

        assert!(relighter.set_environment(wide).is_err());

        let larger = TransportMatrix::from_data(1, 1, 8, vec![0.0; 24]).unwrap();
        assert!(relighter.set_scene(Scene::from_transport(larger, None)).is_err());
        assert!(relighter.set_scene(scene()).is_ok());
    }

    #[test]
    fn scene_basis_must_match_settings() {
        let mut assets = MemoryAssets::new();

        for index in 0..4 {
            let image = Rgba8Image::from_fn(1, 1, |_, _| [(index + 1) as f32 / 4.0; 3]);
            assets.insert(format!("scene/{:03}.png", index), image);
        }

        let haar_settings = Settings {
            basis: Basis::Haar,
            ..settings()
        };

        let pixel_scene = Scene::build(&assets, Path::new("scene"), &settings()).unwrap();
        let haar_scene = Scene::build(&assets, Path::new("scene"), &haar_settings).unwrap();
        let lighting = environment([1.0, 0.5, 0.0, 0.25]);

        let mismatched = Relighter::new(haar_settings.clone(), pixel_scene.clone(), lighting.clone());
        assert!(mismatched.is_err());

        let mismatched = Relighter::new(settings(), haar_scene.clone(), lighting.clone());
        assert!(mismatched.is_err());

        let mut relighter = Relighter::new(haar_settings, haar_scene, lighting).unwrap();
        assert!(relighter.set_scene(pixel_scene).is_err());
        assert_eq!(relighter.scene().layout, Some(HaarLayout::Square(2)));

        let frame = relighter.render_frame().unwrap();
        assert_eq!(frame.pixels.len(), 3);
    }

    #[test]
    fn policy_switch_changes_selection() {
        let mut relighter = Relighter::new(
            Settings {
                top_k: 1,
                ..settings()
            },
            scene(),
            environment([1.0, 0.9, 0.0, 0.0]),
        )
        .unwrap();

        // naive picks index 0 (0.2 * 1.0), weighted picks index 1 (0.4 * 0.9)
        let naive = relighter.render_frame().unwrap();
        relighter.set_importance_policy(ImportancePolicy::Weighted);
        let weighted = relighter.render_frame().unwrap();

        assert_eq!(naive.pixels, vec![10, 10, 10]);
        assert_eq!(weighted.pixels, vec![33, 33, 33]);
    }
}
