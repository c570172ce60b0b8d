//! Two scenes sharing presence through a running relay

use glam::Vec2;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use cursor_tether::client::{ChannelEvent, CursorChannel};
use cursor_tether::config::Config;
use cursor_tether::cursor::PointerEvent;
use cursor_tether::scene::{FrameSnapshot, Scene};
use cursor_tether::server::RelayServer;

const DT: f32 = 1.0 / 60.0;

fn scene(config: &Config) -> Scene {
    Scene::new(
        config.scene.clone(),
        config.rope.clone(),
        config.character.clone(),
        config.smoother.clone(),
        config.viewport().unwrap(),
    )
    .unwrap()
}

/// Pump channel events into the scene and render one frame
fn pump(scene: &mut Scene, channel: &mut CursorChannel) -> FrameSnapshot {
    let now = Instant::now();
    while let Some(event) = channel.try_recv() {
        match event {
            ChannelEvent::Message(message) => scene.handle_server_message(message, now),
            ChannelEvent::Disconnected => scene.handle_disconnect(),
            ChannelEvent::Connected => {}
        }
    }
    if let Some(update) = scene.poll_outbound(now) {
        channel.send(update).unwrap();
    }
    scene.frame(now, DT)
}

#[tokio::test]
async fn test_remote_cursor_appears_in_other_scene() {
    let mut config = Config::default();
    config.server.broadcast_interval_ms = 20;
    config.smoother.min_interval_ms = 1;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let relay = tokio::spawn(RelayServer::new(config.clone()).serve(listener, async {
        let _ = stop_rx.await;
    }));

    let delay = Duration::from_millis(50);
    let mut channel_a = CursorChannel::connect(url.clone(), delay).unwrap();
    let mut channel_b = CursorChannel::connect(url, delay).unwrap();
    let mut scene_a = scene(&config);
    let mut scene_b = scene(&config);

    // Centre of the 1280x800 canvas maps to the world origin
    let centre = Vec2::new(640.0, 400.0);
    if let Some(update) = scene_a.handle_pointer(PointerEvent::Enter(centre), Instant::now()) {
        channel_a.send(update).unwrap();
    }

    let found = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            pump(&mut scene_a, &mut channel_a);
            let snapshot = pump(&mut scene_b, &mut channel_b);
            if let (Some(id_a), Some(remote)) = (
                scene_a.self_id().map(str::to_string),
                snapshot.cursors.iter().find(|c| !c.is_self),
            ) {
                if remote.id == id_a {
                    return remote.position;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("remote cursor never appeared");

    assert!(found.truncate().length() < 1e-3);
    assert_eq!(scene_b.remote_count(), 1);
    assert!(scene_b.self_id().is_some());

    channel_a.shutdown();
    channel_b.shutdown();
    let _ = stop_tx.send(());
    relay.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_channel_reconnects_after_relay_restart() {
    let config = Config::default();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let relay = tokio::spawn(RelayServer::new(config.clone()).serve(listener, async {
        let _ = stop_rx.await;
    }));

    let mut channel =
        CursorChannel::connect(format!("ws://{}", addr), Duration::from_millis(50)).unwrap();

    let wait = Duration::from_secs(5);
    assert_eq!(
        tokio::time::timeout(wait, channel.recv()).await.unwrap(),
        Some(ChannelEvent::Connected)
    );

    let _ = stop_tx.send(());
    relay.await.unwrap().unwrap();

    // Events until the disconnect
    loop {
        match tokio::time::timeout(wait, channel.recv()).await.unwrap() {
            Some(ChannelEvent::Disconnected) => break,
            Some(_) => continue,
            None => panic!("channel stopped"),
        }
    }

    // Same port, fresh relay
    let listener = TcpListener::bind(addr).await.unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let relay = tokio::spawn(RelayServer::new(config).serve(listener, async {
        let _ = stop_rx.await;
    }));

    loop {
        match tokio::time::timeout(wait, channel.recv()).await.unwrap() {
            Some(ChannelEvent::Connected) => break,
            Some(_) => continue,
            None => panic!("channel stopped"),
        }
    }

    channel.shutdown();
    let _ = stop_tx.send(());
    relay.await.unwrap().unwrap();
}
