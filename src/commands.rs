//! Pure mapping from operation requests to executable command specs. No
//! side effects, no I/O; tool names come from [`AgentConfig`], never from
//! embedded constants, so tests can substitute stub executables.

use crate::config::AgentConfig;
use crate::ops::request::{
    CreateSnapshotRequest, DestroySnapshotRequest, ReceiveSnapshotRequest, SendSnapshotRequest,
};
use crate::subprocess::{ProcessCommand, ProcessCommandBuilder};

/// `zfs snapshot [-r] <name>`. The snapshot name is always last.
pub fn snapshot_command(config: &AgentConfig, request: &CreateSnapshotRequest) -> ProcessCommand {
    let mut builder = ProcessCommandBuilder::new(&config.zfs_program).arg("snapshot");
    if request.recursive {
        builder = builder.arg("-r");
    }
    builder.arg(&request.snapshot_name).build()
}

/// `zfs destroy <name>`.
pub fn destroy_command(config: &AgentConfig, request: &DestroySnapshotRequest) -> ProcessCommand {
    ProcessCommandBuilder::new(&config.zfs_program)
        .arg("destroy")
        .arg(&request.snapshot_name)
        .build()
}

/// `zfs send [-I <src>] [-p] <name>`. Incremental sends name their source
/// ahead of the target; `-p` applies only to non-incremental sends, so the
/// two flags never appear together. Callers validate that an incremental
/// request carries a source before building.
pub fn send_command(config: &AgentConfig, request: &SendSnapshotRequest) -> ProcessCommand {
    let mut builder = ProcessCommandBuilder::new(&config.zfs_program).arg("send");
    if request.incremental {
        if let Some(source) = &request.source_snapshot_name {
            builder = builder.arg("-I").arg(source);
        }
    } else if request.include_properties {
        builder = builder.arg("-p");
    }
    builder.arg(&request.snapshot_name).build()
}

/// `zfs receive [-F] <target>`.
pub fn receive_command(config: &AgentConfig, request: &ReceiveSnapshotRequest) -> ProcessCommand {
    let mut builder = ProcessCommandBuilder::new(&config.zfs_program).arg("receive");
    if request.force_rollback {
        builder = builder.arg("-F");
    }
    builder.arg(&request.target).build()
}

/// `mbuffer -O <host>:<port> -m <size> -r <rate>`: outbound relay that
/// forwards its stdin to a remote listener.
pub fn mbuffer_outbound_command(
    config: &AgentConfig,
    request: &SendSnapshotRequest,
) -> ProcessCommand {
    ProcessCommandBuilder::new(&config.mbuffer_program)
        .arg("-O")
        .arg(&format!("{}:{}", request.host, request.port))
        .arg("-m")
        .arg(request.mbuffer_size.as_deref().unwrap_or(&config.mbuffer_size))
        .arg("-r")
        .arg(request.mbuffer_rate.as_deref().unwrap_or(&config.mbuffer_rate))
        .build()
}

/// `mbuffer -I <port> -m <size> -r <rate>`: inbound listener that emits the
/// received bytes on stdout.
pub fn mbuffer_inbound_command(
    config: &AgentConfig,
    request: &ReceiveSnapshotRequest,
) -> ProcessCommand {
    ProcessCommandBuilder::new(&config.mbuffer_program)
        .arg("-I")
        .arg(&request.port.to_string())
        .arg("-m")
        .arg(request.mbuffer_size.as_deref().unwrap_or(&config.mbuffer_size))
        .arg("-r")
        .arg(request.mbuffer_rate.as_deref().unwrap_or(&config.mbuffer_rate))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AgentConfig {
        AgentConfig::default()
    }

    fn send_request() -> SendSnapshotRequest {
        SendSnapshotRequest {
            snapshot_name: "tank/data@s2".to_string(),
            host: "10.0.0.5".to_string(),
            port: 9000,
            incremental: false,
            source_snapshot_name: None,
            include_properties: false,
            mbuffer_size: None,
            mbuffer_rate: None,
        }
    }

    #[test]
    fn test_snapshot_command_plain() {
        let command = snapshot_command(
            &config(),
            &CreateSnapshotRequest {
                snapshot_name: "tank/data@s1".to_string(),
                recursive: false,
            },
        );

        assert_eq!(command.program, "zfs");
        assert_eq!(command.args, vec!["snapshot", "tank/data@s1"]);
    }

    #[test]
    fn test_snapshot_command_recursive_flag_precedes_name() {
        let command = snapshot_command(
            &config(),
            &CreateSnapshotRequest {
                snapshot_name: "tank/data@s1".to_string(),
                recursive: true,
            },
        );

        assert_eq!(command.args, vec!["snapshot", "-r", "tank/data@s1"]);
        assert_eq!(command.args.last().unwrap(), "tank/data@s1");
    }

    #[test]
    fn test_destroy_command() {
        let command = destroy_command(
            &config(),
            &DestroySnapshotRequest {
                snapshot_name: "tank/data@old".to_string(),
            },
        );

        assert_eq!(command.args, vec!["destroy", "tank/data@old"]);
    }

    #[test]
    fn test_send_command_full() {
        let command = send_command(&config(), &send_request());
        assert_eq!(command.args, vec!["send", "tank/data@s2"]);
    }

    #[test]
    fn test_send_command_incremental_source_precedes_target() {
        let mut request = send_request();
        request.incremental = true;
        request.source_snapshot_name = Some("tank/data@s1".to_string());

        let command = send_command(&config(), &request);
        assert_eq!(
            command.args,
            vec!["send", "-I", "tank/data@s1", "tank/data@s2"]
        );
    }

    #[test]
    fn test_send_command_properties_flag() {
        let mut request = send_request();
        request.include_properties = true;

        let command = send_command(&config(), &request);
        assert_eq!(command.args, vec!["send", "-p", "tank/data@s2"]);
    }

    #[test]
    fn test_send_command_incremental_wins_over_properties() {
        let mut request = send_request();
        request.incremental = true;
        request.source_snapshot_name = Some("tank/data@s1".to_string());
        request.include_properties = true;

        let command = send_command(&config(), &request);
        assert!(!command.args.contains(&"-p".to_string()));
        assert_eq!(
            command.args,
            vec!["send", "-I", "tank/data@s1", "tank/data@s2"]
        );
    }

    #[test]
    fn test_receive_command_rollback_flag_precedes_target() {
        let command = receive_command(
            &config(),
            &ReceiveSnapshotRequest {
                target: "tank/restore".to_string(),
                port: 9001,
                force_rollback: true,
                mbuffer_size: None,
                mbuffer_rate: None,
            },
        );

        assert_eq!(command.args, vec!["receive", "-F", "tank/restore"]);
    }

    #[test]
    fn test_mbuffer_outbound_command_uses_request_overrides() {
        let mut request = send_request();
        request.mbuffer_size = Some("2G".to_string());
        request.mbuffer_rate = Some("500k".to_string());

        let command = mbuffer_outbound_command(&config(), &request);
        assert_eq!(command.program, "mbuffer");
        assert_eq!(
            command.args,
            vec!["-O", "10.0.0.5:9000", "-m", "2G", "-r", "500k"]
        );
    }

    #[test]
    fn test_mbuffer_inbound_command_falls_back_to_config_defaults() {
        let command = mbuffer_inbound_command(
            &config(),
            &ReceiveSnapshotRequest {
                target: "tank/restore".to_string(),
                port: 9001,
                force_rollback: false,
                mbuffer_size: None,
                mbuffer_rate: None,
            },
        );

        assert_eq!(command.args, vec!["-I", "9001", "-m", "1G", "-r", "1G"]);
    }
}
