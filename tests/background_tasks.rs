use modal_mesh::{
    tetrahedralize, BackgroundTask, MaterialPreset, ModalError, ModalParams, Pipeline, PipelineEvent,
    Plc, PolyhedralMesh, TaskPoll, TaskState, TetQuality, VolumeGenerator,
};
use std::thread;
use std::time::Duration;

#[test]
fn test_volume_generation_positive_for_closed_surfaces() {
    let surfaces = [
        PolyhedralMesh::tetrahedron(1.0),
        PolyhedralMesh::cube(2.0),
        modal_mesh::convex_hull(PolyhedralMesh::cube(1.0).vertices()).unwrap(),
    ];
    for surface in &surfaces {
        for quality in [TetQuality::Plain, TetQuality::Quality] {
            let volume = tetrahedralize(surface, quality).unwrap();
            assert!(volume.num_tetrahedra() > 0);
            assert!(volume.total_volume() > 0.0);
            assert!(volume.quality().is_acceptable());
        }
    }
}

#[test]
fn test_quality_mode_adds_points() {
    let plc = Plc::from_mesh(&PolyhedralMesh::cube(1.0)).unwrap();
    let generator = VolumeGenerator::new();
    let plain = generator.generate(&plc, TetQuality::Plain).unwrap();
    let quality = generator.generate(&plc, TetQuality::Quality).unwrap();
    assert!(quality.num_vertices() > plain.num_vertices());
}

#[test]
fn test_task_lifecycle() {
    let mut task = BackgroundTask::new("volume");
    assert_eq!(task.state(), TaskState::Idle);
    task.launch(|_| tetrahedralize(&PolyhedralMesh::cube(1.0), TetQuality::Plain))
        .unwrap();

    let mut completions = 0;
    loop {
        match task.poll() {
            TaskPoll::Running => thread::sleep(Duration::from_millis(1)),
            TaskPoll::Completed(result) => {
                completions += 1;
                assert!(result.unwrap().total_volume() > 0.0);
            }
            TaskPoll::Idle => break,
        }
    }
    assert_eq!(completions, 1);
    assert_eq!(task.state(), TaskState::Idle);
}

#[test]
fn test_task_errors_reach_poller() {
    let mut task: BackgroundTask<()> = BackgroundTask::new("failing");
    task.launch(|_| Err(ModalError::EmptyVolume)).unwrap();
    assert!(matches!(task.wait(), TaskPoll::Completed(Err(ModalError::EmptyVolume))));
}

#[test]
fn test_pipeline_end_to_end() {
    let mut pipeline = Pipeline::new(PolyhedralMesh::cube(1.0));
    pipeline.set_channel_count(6);
    pipeline.request_volume(TetQuality::Quality).unwrap();
    pipeline.wait();
    assert!(pipeline.volume().is_some());

    let params = ModalParams::default().with_band(20.0, 20_000.0).with_modes(5, 15);
    pipeline
        .request_modal(MaterialPreset::Ceramic.properties(), params)
        .unwrap();
    let mut model = None;
    while model.is_none() {
        for event in pipeline.update() {
            match event {
                PipelineEvent::ModalReady(m) => model = Some(m),
                PipelineEvent::ModalFailed(e) => panic!("modal build failed: {}", e),
                _ => {}
            }
        }
        thread::sleep(Duration::from_millis(1));
    }
    let model = model.unwrap();
    assert!(model.num_modes() >= 1 && model.num_modes() <= 5);
    assert_eq!(model.channels, pipeline.channels().indices().to_vec());
}
