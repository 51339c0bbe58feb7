//! Integration tests for php-web and procmgr

mod procmgr_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn procmgr() -> Command {
        cargo_bin_cmd!("procmgr")
    }

    fn procs_file(dir: &Path, yaml: &str) -> PathBuf {
        let path = dir.join("procs.yml");
        fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn no_arguments_prints_usage() {
        procmgr()
            .assert()
            .code(1)
            .stderr(predicate::str::contains("procmgr <path-to-procs.yml>"));
    }

    #[test]
    fn too_many_arguments_prints_usage() {
        procmgr()
            .args(["a.yml", "b.yml"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Usage:"));
    }

    #[test]
    fn unparsable_file_exits_2() {
        let dir = TempDir::new().unwrap();
        let path = procs_file(dir.path(), "processes:\n  web:\n    cmd: httpd\n");

        procmgr()
            .arg(&path)
            .assert()
            .code(2)
            .stderr(predicate::str::contains("error loading/parsing procs file"));
    }

    #[test]
    fn missing_file_exits_2() {
        let dir = TempDir::new().unwrap();
        procmgr()
            .arg(dir.path().join("nope.yml"))
            .assert()
            .code(2);
    }

    #[cfg(unix)]
    #[test]
    fn first_clean_exit_ends_supervision() {
        let dir = TempDir::new().unwrap();
        let path = procs_file(
            dir.path(),
            "processes:\n  quick:\n    command: sh\n    args: [\"-c\", \"exit 0\"]\n  slow:\n    command: sleep\n    args: [\"30\"]\n",
        );

        procmgr()
            .arg(&path)
            .timeout(std::time::Duration::from_secs(10))
            .assert()
            .success()
            .stderr(predicate::str::contains("process quick exited"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_child_code_is_propagated() {
        let dir = TempDir::new().unwrap();
        let path = procs_file(
            dir.path(),
            "processes:\n  broken:\n    command: sh\n    args: [\"-c\", \"exit 7\"]\n  slow:\n    command: sleep\n    args: [\"30\"]\n",
        );

        procmgr()
            .arg(&path)
            .timeout(std::time::Duration::from_secs(10))
            .assert()
            .code(7)
            .stderr(predicate::str::contains("process broken exited"));
    }

    #[test]
    fn unstartable_command_exits_1() {
        let dir = TempDir::new().unwrap();
        let path = procs_file(
            dir.path(),
            "processes:\n  ghost:\n    command: /definitely/not/a/binary\n",
        );

        procmgr()
            .arg(&path)
            .timeout(std::time::Duration::from_secs(10))
            .assert()
            .code(1)
            .stderr(predicate::str::contains("process ghost failed to run"));
    }

    #[cfg(unix)]
    #[test]
    fn killed_child_stops_the_group() {
        use std::time::{Duration, Instant};

        let dir = TempDir::new().unwrap();
        let pid_file = dir.path().join("victim.pid");
        let path = procs_file(
            dir.path(),
            &format!(
                "processes:\n  victim:\n    command: sh\n    args: [\"-c\", \"echo $$ > {}; exec sleep 30\"]\n  bystander:\n    command: sleep\n    args: [\"30\"]\n",
                pid_file.display()
            ),
        );

        let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_procmgr"))
            .arg(&path)
            .spawn()
            .unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let pid = loop {
            if let Some(pid) = fs::read_to_string(&pid_file)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
            {
                break pid;
            }
            assert!(Instant::now() < deadline, "victim never started");
            std::thread::sleep(Duration::from_millis(50));
        };

        let killed = std::process::Command::new("kill")
            .args(["-TERM", &pid])
            .status()
            .unwrap();
        assert!(killed.success());

        let status = loop {
            if let Some(status) = child.try_wait().unwrap() {
                break status;
            }
            if Instant::now() > deadline {
                let _ = child.kill();
                panic!("procmgr did not exit after its child was killed");
            }
            std::thread::sleep(Duration::from_millis(50));
        };
        assert_eq!(status.code(), Some(128 + 15));
    }
}

mod php_web_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    fn php_web() -> Command {
        let mut cmd = cargo_bin_cmd!("php-web");
        for var in [
            "BP_PHP_SERVER",
            "BP_PHP_WEB_DIR",
            "BP_PHP_LIB_DIR",
            "BP_PHP_SERVER_ADMIN",
            "CNB_APP_DIR",
            "CNB_LAYERS_DIR",
        ] {
            cmd.env_remove(var);
        }
        cmd
    }

    #[test]
    fn help_displays() {
        php_web()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build"))
            .stdout(predicate::str::contains("detect"));
    }

    #[test]
    fn detect_fails_without_php() {
        let app = TempDir::new().unwrap();
        fs::write(app.path().join("index.html"), "<html/>").unwrap();

        php_web()
            .args(["detect", "--app"])
            .arg(app.path())
            .assert()
            .code(100);
    }

    #[test]
    fn detect_prints_plan() {
        let app = TempDir::new().unwrap();
        fs::create_dir_all(app.path().join("htdocs")).unwrap();
        fs::write(app.path().join("htdocs/index.php"), "<?php").unwrap();

        php_web()
            .args(["detect", "--app"])
            .arg(app.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("php-web"))
            .stdout(predicate::str::contains("[[requires]]"));
    }

    #[test]
    fn build_nginx_app() {
        let app = TempDir::new().unwrap();
        let layers = TempDir::new().unwrap();
        fs::create_dir_all(app.path().join("htdocs")).unwrap();
        fs::write(app.path().join("htdocs/index.php"), "<?php phpinfo();").unwrap();
        fs::write(app.path().join("buildpack.yml"), "php:\n  webserver: nginx\n").unwrap();

        php_web()
            .args(["build", "--app"])
            .arg(app.path())
            .arg("--layers")
            .arg(layers.path())
            .args(["--buildpack-version", "1.2.3", "--php-home", "/layers/php"])
            .arg("--procmgr-bin")
            .arg(env!("CARGO_BIN_EXE_procmgr"))
            .assert()
            .success();

        let layer = layers.path().join("php-web");
        assert!(app.path().join("nginx.conf").is_file());
        assert!(layer.join("etc/php.ini").is_file());
        assert!(layer.join("etc/php-fpm.conf").is_file());
        assert!(layer.join("bin/procmgr").is_file());
        assert!(layers.path().join("php-web.toml").is_file());

        let procs = fs::read_to_string(layer.join("procs.yml")).unwrap();
        assert!(procs.contains("nginx"));
        assert!(procs.contains("php-fpm"));

        let launch = fs::read_to_string(layers.path().join("launch.toml")).unwrap();
        assert!(launch.contains(&format!("procmgr {}", layer.join("procs.yml").display())));
    }

    #[test]
    fn build_script_app() {
        let app = TempDir::new().unwrap();
        let layers = TempDir::new().unwrap();
        fs::write(app.path().join("run.php"), "<?php echo 1;").unwrap();

        php_web()
            .args(["build", "--app"])
            .arg(app.path())
            .arg("--layers")
            .arg(layers.path())
            .args(["--buildpack-version", "1.2.3"])
            .assert()
            .success();

        let launch = fs::read_to_string(layers.path().join("launch.toml")).unwrap();
        assert!(launch.contains(&format!("php {}", app.path().join("run.php").display())));
        assert!(!layers.path().join("php-web/procs.yml").exists());
    }

    #[test]
    fn build_unsupported_web_server() {
        let app = TempDir::new().unwrap();
        let layers = TempDir::new().unwrap();
        fs::create_dir_all(app.path().join("htdocs")).unwrap();
        fs::write(app.path().join("htdocs/index.php"), "<?php").unwrap();
        fs::write(app.path().join("buildpack.yml"), "php:\n  webserver: lighttpd\n").unwrap();

        let output = php_web()
            .args(["build", "--app"])
            .arg(app.path())
            .arg("--layers")
            .arg(layers.path())
            .args(["--buildpack-version", "1.2.3"])
            .assert()
            .success()
            .stderr(predicate::str::contains("Unsupported web server 'lighttpd'"))
            .get_output()
            .clone();

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert_eq!(stderr.matches("lighttpd").count(), 1, "{}", stderr);
        assert!(!stderr.contains("nothing to start"), "{}", stderr);
        assert!(layers.path().join("php-web.toml").is_file());
        assert!(layers.path().join("php-web/etc/php.ini").is_file());
        assert!(!layers.path().join("launch.toml").exists());
        assert!(!layers.path().join("php-web/procs.yml").exists());
    }

    #[test]
    fn build_reports_failing_feature() {
        let app = TempDir::new().unwrap();
        let layers = TempDir::new().unwrap();
        fs::create_dir_all(app.path().join("htdocs")).unwrap();
        fs::write(app.path().join("htdocs/index.php"), "<?php").unwrap();
        fs::write(app.path().join("buildpack.yml"), "php:\n  webserver: httpd\n").unwrap();

        php_web()
            .args(["build", "--app"])
            .arg(app.path())
            .arg("--layers")
            .arg(layers.path())
            .args(["--buildpack-version", "1.2.3"])
            .arg("--procmgr-bin")
            .arg(app.path().join("missing-procmgr"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("procmgr"));

        // features before the failing one already ran
        assert!(app.path().join("httpd.conf").is_file());
        assert!(!layers.path().join("php-web.toml").exists());
    }
}
