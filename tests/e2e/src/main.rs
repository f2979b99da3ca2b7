fn main() {
    println!("Run `cargo test -p ferry-e2e` to execute the end-to-end transfer tests.");
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use ferry_admission::{AdmissionConfig, PeerIdentity};
    use ferry_receiver::{
        ChannelSink, ReceiverConfig, ReceiverServer, SamplingRate, StorageLayout, TransferEvent,
    };
    use ferry_sender::{
        FileStatus, SenderOptions, TransferOutcome, send_file, send_files, source_files,
    };
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::mpsc;

    struct Harness {
        server: Arc<ReceiverServer>,
        addr: SocketAddr,
        events: mpsc::Receiver<TransferEvent>,
        save_dir: PathBuf,
        sample_dir: PathBuf,
    }

    impl Harness {
        async fn start(root: &Path, sampling_rate: SamplingRate, max_requests: u32) -> Self {
            let save_dir = root.join("server_files");
            let sample_dir = root.join("server_sampling");
            let config = ReceiverConfig {
                bind_addr: "127.0.0.1:0".parse().unwrap(),
                storage: StorageLayout {
                    save_dir: save_dir.clone(),
                    sample_dir: sample_dir.clone(),
                    ..StorageLayout::default()
                },
                sampling_rate,
                admission: AdmissionConfig::new(
                    max_requests,
                    Duration::from_secs(60),
                    PeerIdentity::Address,
                )
                .unwrap(),
                ..ReceiverConfig::default()
            };

            let (sink, events) = ChannelSink::channel(256);
            let server = ReceiverServer::new(config, Arc::new(sink));
            let listener = server.listen().await.unwrap();
            let addr = listener.local_addr().unwrap();
            let run = Arc::clone(&server);
            tokio::spawn(async move { run.serve(listener).await });

            Self {
                server,
                addr,
                events,
                save_dir,
                sample_dir,
            }
        }

        fn stored(&self, name: &str) -> PathBuf {
            self.save_dir.join(format!("server_received_{name}"))
        }

        fn sampled(&self, name: &str) -> PathBuf {
            self.sample_dir.join(format!("server_received_{name}"))
        }
    }

    fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
        let mut data = vec![0u8; len];
        StdRng::seed_from_u64(seed).fill_bytes(&mut data);
        data
    }

    fn write_source(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[tokio::test]
    async fn ten_thousand_zero_bytes() {
        let server_root = tempfile::tempdir().unwrap();
        let client_root = tempfile::tempdir().unwrap();
        let mut harness = Harness::start(server_root.path(), SamplingRate::NEVER, 5).await;

        let path = write_source(client_root.path(), "a.bin", &[0u8; 10_000]);
        let outcome = send_file(harness.addr, &path, &SenderOptions::default())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            TransferOutcome::Verified {
                checksum: 0x4d3b_ca2e
            }
        );

        let stored = std::fs::read(harness.stored("a.bin")).unwrap();
        assert_eq!(stored.len(), 10_000);
        assert!(stored.iter().all(|&b| b == 0));

        let event = harness.events.recv().await.unwrap();
        assert!(event.is_ok());
        assert_eq!(event.bytes, 10_000);
        assert_eq!(event.checksum, Some(0x4d3b_ca2e));
    }

    #[tokio::test]
    async fn round_trip_preserves_contents() {
        let server_root = tempfile::tempdir().unwrap();
        let client_root = tempfile::tempdir().unwrap();
        let mut harness = Harness::start(server_root.path(), SamplingRate::NEVER, 10).await;

        let cases = [
            ("empty.txt", Vec::new()),
            ("one.txt", vec![b'x']),
            ("text.txt", b"hello world".repeat(1_000)),
            ("random.bin", random_bytes(1_000_000, 7)),
        ];

        for (name, data) in &cases {
            let path = write_source(client_root.path(), name, data);
            let outcome = send_file(harness.addr, &path, &SenderOptions::default())
                .await
                .unwrap();
            assert!(outcome.is_verified(), "{name}: {outcome:?}");
            assert_eq!(&std::fs::read(harness.stored(name)).unwrap(), data, "{name}");
            assert!(harness.events.recv().await.unwrap().is_ok());
        }
    }

    /// Forwards sender traffic to the receiver, flipping one byte.
    async fn tampering_proxy(upstream: SocketAddr, flip_at: usize) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (client, _) = listener.accept().await.unwrap();
            let server = TcpStream::connect(upstream).await.unwrap();
            let (mut client_rx, mut client_tx) = client.into_split();
            let (mut server_rx, mut server_tx) = server.into_split();

            tokio::spawn(async move {
                let _ = tokio::io::copy(&mut server_rx, &mut client_tx).await;
                let _ = client_tx.shutdown().await;
            });

            let mut offset = 0;
            let mut buf = vec![0u8; 4096];
            loop {
                let n = match client_rx.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                if (offset..offset + n).contains(&flip_at) {
                    buf[flip_at - offset] ^= 0xFF;
                }
                offset += n;
                if server_tx.write_all(&buf[..n]).await.is_err() {
                    break;
                }
            }
            let _ = server_tx.shutdown().await;
        });
        addr
    }

    #[tokio::test]
    async fn corrupted_payload_is_never_verified() {
        let server_root = tempfile::tempdir().unwrap();
        let client_root = tempfile::tempdir().unwrap();
        let mut harness = Harness::start(server_root.path(), SamplingRate::NEVER, 5).await;

        let data = random_bytes(50_000, 11);
        let path = write_source(client_root.path(), "t.bin", &data);
        let proxy = tampering_proxy(harness.addr, 2_000).await;

        let result = send_file(proxy, &path, &SenderOptions::default()).await;
        assert!(
            !matches!(result, Ok(TransferOutcome::Verified { .. })),
            "{result:?}"
        );

        let event = harness.events.recv().await.unwrap();
        assert!(!event.is_ok());
        assert_eq!(event.checksum, None);
    }

    #[tokio::test]
    async fn excess_connections_are_rejected() {
        let server_root = tempfile::tempdir().unwrap();
        let client_root = tempfile::tempdir().unwrap();
        let mut harness = Harness::start(server_root.path(), SamplingRate::NEVER, 2).await;

        for name in ["1.txt", "2.txt"] {
            let path = write_source(client_root.path(), name, name.as_bytes());
            let outcome = send_file(harness.addr, &path, &SenderOptions::default())
                .await
                .unwrap();
            assert!(outcome.is_verified());
            assert!(harness.events.recv().await.unwrap().is_ok());
        }

        let path = write_source(client_root.path(), "3.txt", b"3.txt");
        assert!(
            send_file(harness.addr, &path, &SenderOptions::default())
                .await
                .is_err()
        );
        assert!(!harness.stored("3.txt").exists());

        let metrics = harness.server.admission().metrics();
        assert_eq!(metrics.admitted, 2);
        assert_eq!(metrics.rejected, 1);
        assert!(harness.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn concurrent_sessions_are_independent() {
        const SESSIONS: u64 = 8;

        let server_root = tempfile::tempdir().unwrap();
        let client_root = tempfile::tempdir().unwrap();
        let mut harness = Harness::start(server_root.path(), SamplingRate::NEVER, 100).await;

        let mut tasks = Vec::new();
        for i in 0..SESSIONS {
            let name = format!("file{i}.bin");
            let data = random_bytes(200_000 + i as usize * 1_000, i);
            let path = write_source(client_root.path(), &name, &data);
            let addr = harness.addr;
            tasks.push(tokio::spawn(async move {
                let outcome = send_file(addr, &path, &SenderOptions::default()).await;
                (name, data, outcome)
            }));
        }

        for task in tasks {
            let (name, data, outcome) = task.await.unwrap();
            assert!(outcome.unwrap().is_verified(), "{name}");
            assert_eq!(std::fs::read(harness.stored(&name)).unwrap(), data);
        }
        for _ in 0..SESSIONS {
            assert!(harness.events.recv().await.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn always_sampling_writes_identical_copy() {
        let server_root = tempfile::tempdir().unwrap();
        let client_root = tempfile::tempdir().unwrap();
        let mut harness = Harness::start(server_root.path(), SamplingRate::ALWAYS, 5).await;

        let data = random_bytes(70_000, 3);
        let path = write_source(client_root.path(), "s.bin", &data);
        send_file(harness.addr, &path, &SenderOptions::default())
            .await
            .unwrap();

        assert_eq!(std::fs::read(harness.sampled("s.bin")).unwrap(), data);
        assert!(harness.events.recv().await.unwrap().sampled);
    }

    #[tokio::test]
    async fn never_sampling_leaves_sample_dir_empty() {
        let server_root = tempfile::tempdir().unwrap();
        let client_root = tempfile::tempdir().unwrap();
        let mut harness = Harness::start(server_root.path(), SamplingRate::NEVER, 5).await;

        let path = write_source(client_root.path(), "n.bin", b"not sampled");
        send_file(harness.addr, &path, &SenderOptions::default())
            .await
            .unwrap();

        assert!(!harness.events.recv().await.unwrap().sampled);
        assert!(harness.stored("n.bin").exists());
        assert_eq!(std::fs::read_dir(&harness.sample_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn directory_run_sends_every_file() {
        let server_root = tempfile::tempdir().unwrap();
        let client_root = tempfile::tempdir().unwrap();
        let harness = Harness::start(server_root.path(), SamplingRate::NEVER, 10).await;

        for (i, name) in ["c.txt", "a.txt", "b.txt"].iter().enumerate() {
            write_source(client_root.path(), name, &random_bytes(5_000, i as u64));
        }

        let files = source_files(client_root.path()).await.unwrap();
        let reports = send_files(harness.addr, files, &SenderOptions::default()).await;

        let names: Vec<_> = reports
            .iter()
            .map(|r| r.path.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        assert_eq!(names, ["a.txt", "b.txt", "c.txt"]);
        for report in &reports {
            assert!(
                matches!(report.status, FileStatus::Sent(TransferOutcome::Verified { .. })),
                "{report:?}"
            );
            let name = report.path.file_name().unwrap().to_str().unwrap();
            assert_eq!(
                std::fs::read(harness.stored(name)).unwrap(),
                std::fs::read(&report.path).unwrap()
            );
        }
    }

    #[tokio::test]
    async fn shutdown_drains_then_stops_accepting() {
        let server_root = tempfile::tempdir().unwrap();
        let client_root = tempfile::tempdir().unwrap();
        let harness = Harness::start(server_root.path(), SamplingRate::NEVER, 5).await;

        let path = write_source(client_root.path(), "last.txt", b"last");
        send_file(harness.addr, &path, &SenderOptions::default())
            .await
            .unwrap();

        harness.server.shutdown();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if TcpStream::connect(harness.addr).await.is_err() {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "listener still open");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}
