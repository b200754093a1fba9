use crossbeam_channel::unbounded;
use modal_mesh::{
    tetrahedralize, ContactPoint, ExcitationChannels, ExcitationRouter, PolyhedralMesh, RouterState,
    SharedRouter, TetQuality, Transform,
};
use nalgebra::{Point3, Vector3};
use std::sync::Arc;

fn cube_volume() -> Arc<modal_mesh::VolumetricMesh> {
    let surface = PolyhedralMesh::cube(1.0);
    Arc::new(tetrahedralize(&surface, TetQuality::Quality).unwrap())
}

#[test]
fn test_channel_sampling_increasing_and_reproducible() {
    let mesh = cube_volume();
    let n = mesh.num_vertices();
    for k in 1..=n.min(200) {
        let a = ExcitationChannels::sample(&mesh, k);
        assert_eq!(a.len(), k);
        assert!(a.indices().windows(2).all(|w| w[0] < w[1]), "k = {}", k);
        assert!(a.indices().iter().all(|&i| i < n));
        assert_eq!(a, ExcitationChannels::sample(&mesh, k));
    }
}

#[test]
fn test_nearest_channel_idempotent() {
    let mesh = cube_volume();
    let channels = ExcitationChannels::sample(&mesh, 10);
    let mut router = ExcitationRouter::new();
    router.set_channels(Arc::clone(&mesh), channels);
    for p in [Point3::new(0.3, -0.2, 0.1), Point3::origin(), Point3::new(5.0, 5.0, 5.0)] {
        let first = router.nearest_channel(&p);
        assert!(first.is_some());
        assert_eq!(first, router.nearest_channel(&p));
    }
}

#[test]
fn test_trigger_then_release_is_idle() {
    let mesh = cube_volume();
    let channels = ExcitationChannels::sample(&mesh, 10);
    let (tx, rx) = unbounded();
    let mut router = ExcitationRouter::new();
    router.set_channels(Arc::clone(&mesh), channels);
    router.attach(tx);

    let hit = router.trigger(mesh.num_vertices() - 1, 0.8).unwrap();
    assert!(matches!(router.state(), RouterState::Triggered { .. }));
    let release = router.release().unwrap();

    assert_eq!(router.state(), RouterState::Idle);
    assert_eq!(router.intensity(), 0.0);
    assert_eq!(release.position, hit.position);
    assert_eq!(release.value, 0.0);
    assert_eq!(rx.try_iter().count(), 2);
}

#[test]
fn test_contact_and_pick_share_one_gate() {
    let mesh = cube_volume();
    let (tx, rx) = unbounded();
    let mut inner = ExcitationRouter::new();
    inner.set_channels(Arc::clone(&mesh), ExcitationChannels::sample(&mesh, 8));
    inner.attach(tx);
    let router = SharedRouter::new(inner);

    let world = Transform::from_translation(Vector3::new(0.0, 2.0, 0.0));
    let contact = ContactPoint::new(Point3::new(0.5, 2.5, 0.5), 0.5);
    let from_contact = router.trigger_contact(&contact, &world, 1.0).unwrap();
    let from_pick = router.trigger_at(&Point3::new(0.5, 0.5, 0.5), 0.5).unwrap();
    assert_eq!(from_contact.position, from_pick.position);
    assert_eq!(from_contact.value, 0.5);

    router.release();
    let values: Vec<f64> = rx.try_iter().map(|e| e.value).collect();
    assert_eq!(values, vec![0.5, 0.5, 0.0]);
}
