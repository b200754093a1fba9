use approx::assert_relative_eq;
use modal_mesh::{
    ExcitationChannels, MaterialPreset, ModalError, ModalModelBuilder, ModalParams, SynthesisProgram,
    VolumetricMesh,
};

fn unit_cube(n: usize) -> VolumetricMesh {
    VolumetricMesh::structured_box(n, n, n, 1.0, 1.0, 1.0).unwrap()
}

#[test]
fn test_steel_unit_cube_scenario() {
    let mesh = unit_cube(3);
    assert_eq!(mesh.num_vertices(), 64);
    assert_relative_eq!(mesh.total_volume(), 1.0, epsilon = 1e-12);

    let steel = MaterialPreset::Steel.properties();
    assert_eq!((steel.density, steel.youngs_modulus, steel.poisson_ratio), (7850.0, 2.0e11, 0.29));

    let channels = ExcitationChannels::sample(&mesh, 10);
    assert_eq!(channels.len(), 10);

    let params = ModalParams::default().with_band(20.0, 10_000.0).with_modes(20, 40);
    let model = ModalModelBuilder::new(steel, params)
        .build(&mesh, channels.indices())
        .unwrap();

    assert!(model.num_modes() >= 1);
    assert!(model.num_modes() <= 20);
    for mode in &model.modes {
        assert!(mode.frequency_hz >= 20.0 && mode.frequency_hz <= 10_000.0);
        assert!(mode.t60 > 0.0 && mode.t60 <= 60.0);
    }
    assert_eq!(model.gains.len(), 10);
    for gains in &model.gains {
        assert_eq!(gains.len(), model.num_modes());
        assert!(gains.iter().all(|g| (0.0..=1.0).contains(g)));
    }

    let program = SynthesisProgram::from_model(&model, "steel-cube");
    assert!(program.text().contains(&format!("nModes = {};", model.num_modes())));
    assert!(program.text().contains("nChannels = 10;"));
}

#[test]
fn test_lowest_elastic_mode_of_cube() {
    let mesh = unit_cube(2);
    let params = ModalParams::default().with_band(0.0, 1.0e6).with_modes(1, 6);
    let model = ModalModelBuilder::new(MaterialPreset::Steel.properties(), params)
        .build(&mesh, &[0, 26])
        .unwrap();
    let f0 = model.modes[0].frequency_hz;
    assert!(f0.is_finite());
    // Same order as the shear-wave scale c_s / L ≈ 3 kHz
    assert!(f0 > 100.0 && f0 < 20_000.0, "f0 = {}", f0);
}

#[test]
fn test_never_more_modes_than_requested() {
    let mesh = unit_cube(2);
    for synth in [1, 3, 7] {
        let params = ModalParams::default().with_band(0.0, 1.0e6).with_modes(synth, 12);
        let model = ModalModelBuilder::new(MaterialPreset::Glass.properties(), params)
            .build(&mesh, &[0, 13])
            .unwrap();
        assert!(model.num_modes() <= synth);
    }
}

#[test]
fn test_softer_material_rings_lower() {
    let mesh = unit_cube(2);
    let params = ModalParams::default().with_band(0.0, 1.0e6).with_modes(1, 6);
    let lowest = |preset: MaterialPreset| {
        ModalModelBuilder::new(preset.properties(), params.clone())
            .build(&mesh, &[0])
            .unwrap()
            .modes[0]
            .frequency_hz
    };
    let steel = lowest(MaterialPreset::Steel);
    let plastic = lowest(MaterialPreset::Plastic);
    assert!(plastic < steel);
}

#[test]
fn test_empty_volume_reported_before_solve() {
    let builder = ModalModelBuilder::new(MaterialPreset::Steel.properties(), ModalParams::default());
    assert!(matches!(
        builder.build(&VolumetricMesh::default(), &[]),
        Err(ModalError::EmptyVolume)
    ));
}
