// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end: configuration file to a working link

use chassis_link::prelude::*;
use std::fs;
use std::thread;
use tempfile::tempdir;

#[test]
fn test_link_opened_from_config_file() {
    let bind = LinkConfig::new("127.0.0.1", 0, 0);
    let listener = ChassisSimulator::listen(&bind).unwrap();
    let ports = listener.link_config().unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("chassis_configuration.toml");
    fs::write(
        &path,
        format!(
            "[link]\nhost = \"127.0.0.1\"\ntx_port = {}\nrx_port = {}\nack_required = true\n\n\
             [logging]\nlevel = \"debug\"\nlog_dir = \"{}\"\n",
            ports.tx_port,
            ports.rx_port,
            dir.path().join("logs").display()
        ),
    )
    .unwrap();

    let config = load_config(Some(path.as_path()), None).unwrap();
    validate_config(&config).unwrap();
    let _logging = chassis_link::init_logging(&config).unwrap();

    let chassis = thread::spawn(move || listener.accept().unwrap());
    let link = chassis_link::open_link(&config).unwrap();
    let mut chassis = chassis.join().unwrap();

    link.write("wheels 10 10").unwrap();
    assert_eq!(chassis.receive_packet().unwrap(), "wheels 10 10");
    chassis.send_packet("odometry 42").unwrap();
    assert_eq!(link.read().unwrap(), "odometry 42");
}

#[test]
fn test_invalid_framing_in_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("chassis_configuration.toml");
    fs::write(&path, "[link]\nframing = \"newline\"\n").unwrap();

    let config = load_config(Some(path.as_path()), None).unwrap();
    assert!(validate_config(&config).is_err());
    assert!(matches!(
        chassis_link::open_link(&config),
        Err(TransportError::InvalidConfig(_))
    ));
}
