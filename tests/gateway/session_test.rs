/*!
 * Session Orchestrator Integration Tests
 * Full sessions against capsules on disk, running real programs
 */

use crate::fixtures::{gateway, gateway_for, request, run, run_with_input, CapsuleDir, ALICE, BOB};
use capsule_gate::{CallerEnv, GatewayConfig, TraversalPolicy, NOT_FOUND_MESSAGE};
use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};

fn reading_capsule() -> CapsuleDir {
    let capsule = CapsuleDir::new();
    capsule
        .write("commands", "# read-only\ncat <path>\ncat\nfalse\nenv\npwd\n")
        .write("content/notes.gmi", "hello capsule\n");
    capsule
}

#[tokio::test]
async fn test_authorized_command_runs() {
    let capsule = reading_capsule();
    let out = run(&gateway_for(&capsule), &request(ALICE, "cat notes.gmi")).await;

    assert_eq!(out.status, 0);
    assert_eq!(out.stdout, "hello capsule\n");
}

#[tokio::test]
async fn test_unmatched_command_is_not_found() {
    let capsule = reading_capsule();
    let out = run(&gateway_for(&capsule), &request(ALICE, "rm -rf /")).await;

    assert_eq!(out.status, 127);
    assert_eq!(out.stdout, NOT_FOUND_MESSAGE);
}

#[tokio::test]
async fn test_escape_attempt_is_not_found() {
    let capsule = reading_capsule();
    let out = run(&gateway_for(&capsule), &request(ALICE, "cat ../../etc/passwd")).await;

    assert_eq!(out.status, 127);
    assert_eq!(out.stdout, NOT_FOUND_MESSAGE);
}

#[tokio::test]
async fn test_strip_policy_keeps_path_inside_capsule() {
    let capsule = reading_capsule();
    let config = GatewayConfig::new(capsule.root()).with_traversal(TraversalPolicy::Strip);
    let out = run(&gateway(config), &request(ALICE, "cat ../../notes.gmi")).await;

    assert_eq!(out.status, 0);
    assert_eq!(out.stdout, "hello capsule\n");
}

#[tokio::test]
async fn test_shell_metacharacters_never_match_path() {
    let capsule = reading_capsule();
    let out = run(&gateway_for(&capsule), &request(ALICE, "cat $(id)")).await;

    assert_eq!(out.status, 127);
    assert_eq!(out.stdout, NOT_FOUND_MESSAGE);
}

#[tokio::test]
async fn test_child_exit_status_passes_through() {
    let capsule = reading_capsule();
    let out = run(&gateway_for(&capsule), &request(ALICE, "false")).await;

    assert_eq!(out.status, 1);
    assert!(out.stdout.is_empty());
}

#[tokio::test]
async fn test_missing_file_reports_on_stderr() {
    let capsule = reading_capsule();
    let out = run(&gateway_for(&capsule), &request(ALICE, "cat missing.gmi")).await;

    assert_ne!(out.status, 0);
    assert!(out.stdout.is_empty());
    assert!(!out.stderr.is_empty(), "cat's diagnostics go to the error stream");
}

#[tokio::test]
async fn test_session_input_reaches_child() {
    let capsule = reading_capsule();
    let out = run_with_input(&gateway_for(&capsule), &request(ALICE, "cat"), b"piped through\n").await;

    assert_eq!(out.status, 0);
    assert_eq!(out.stdout, "piped through\n");
}

#[tokio::test]
async fn test_child_runs_in_content_dir() {
    let capsule = reading_capsule();
    let out = run(&gateway_for(&capsule), &request(ALICE, "pwd")).await;

    let expected = capsule.content().canonicalize().unwrap();
    assert_eq!(out.status, 0);
    assert_eq!(out.stdout.trim_end(), expected.to_str().unwrap());
}

#[tokio::test]
async fn test_child_environment() {
    let capsule = reading_capsule();
    let req = request(ALICE, "env").with_env(
        CallerEnv::new()
            .with_var("LANG", "en_US.UTF-8")
            .with_var("SECRET", "leak"),
    );
    let out = run(&gateway_for(&capsule), &req).await;

    assert_eq!(out.status, 0);
    let lines: Vec<&str> = out.stdout.lines().collect();
    assert!(lines.contains(&"LANG=en_US.UTF-8"));
    assert!(lines.contains(&"HOST=default"));
    assert!(lines.contains(&format!("IDENT={}", ALICE).as_str()));
    assert!(lines.iter().any(|l| l.starts_with("PATH=") && l.contains("/bin")));
    assert!(!lines.iter().any(|l| l.starts_with("TERM=")));
    assert!(!lines.iter().any(|l| l.starts_with("SECRET=")));
}

#[tokio::test]
async fn test_unknown_program_is_not_found() {
    let capsule = CapsuleDir::new();
    capsule.write("commands", "definitely-not-a-real-program-4242\n");
    let out = run(
        &gateway_for(&capsule),
        &request(ALICE, "definitely-not-a-real-program-4242"),
    )
    .await;

    assert_eq!(out.status, 127);
    assert_eq!(out.stdout, NOT_FOUND_MESSAGE);
}

#[tokio::test]
async fn test_deadline_kills_command() {
    let capsule = CapsuleDir::new();
    capsule.write("commands", "sleep 30\n");
    let config = GatewayConfig::new(capsule.root()).with_command_timeout(Some(Duration::from_millis(300)));

    let start = Instant::now();
    let out = run(&gateway(config), &request(ALICE, "sleep 30")).await;

    assert_eq!(out.status, 124);
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_group_commands_require_membership() {
    let capsule = CapsuleDir::new();
    capsule
        .write("commands", "cat <path>\n")
        .write("group", &format!("# admins\n{} admin\n", ALICE))
        .write("commands-admin", "echo admin-only\n");
    let gw = gateway_for(&capsule);

    let out = run(&gw, &request(ALICE, "echo admin-only")).await;
    assert_eq!(out.status, 0);
    assert_eq!(out.stdout, "admin-only\n");

    let out = run(&gw, &request(BOB, "echo admin-only")).await;
    assert_eq!(out.status, 127);
    assert_eq!(out.stdout, NOT_FOUND_MESSAGE);
}

#[tokio::test]
async fn test_missing_group_commands_file_is_ignored() {
    let capsule = CapsuleDir::new();
    capsule
        .write("commands", "echo base\n")
        .write("group", &format!("{} ghost\n", ALICE));
    let out = run(&gateway_for(&capsule), &request(ALICE, "echo base")).await;

    assert_eq!(out.status, 0);
    assert_eq!(out.stdout, "base\n");
}

#[tokio::test]
async fn test_virtual_host_routes_to_extra_capsule() {
    let main = CapsuleDir::new();
    main.write("commands", "echo main\n").write("host", "main.example\n");
    let other = CapsuleDir::new();
    other.write("commands", "echo other\n").write("host", "other.example\n");

    let config = GatewayConfig::new(main.root()).with_capsule(other.root());
    let gw = gateway(config);

    let claim = |host: &str| CallerEnv::new().with_var("HOST", host);

    let out = run(&gw, &request(ALICE, "echo other").with_env(claim("other.example"))).await;
    assert_eq!(out.stdout, "other\n");

    let out = run(&gw, &request(ALICE, "echo main").with_env(claim("unknown.example"))).await;
    assert_eq!(out.stdout, "main\n");

    let out = run(&gw, &request(ALICE, "echo other").with_env(claim(""))).await;
    assert_eq!(out.status, 127);

    let env = CallerEnv::new().with_var("HOST", "").with_var("HOST", "other.example");
    let out = run(&gw, &request(ALICE, "echo other").with_env(env)).await;
    assert_eq!(out.stdout, "other\n");
}

#[tokio::test]
async fn test_default_command_renders_main_document() {
    let capsule = CapsuleDir::new();
    capsule
        .write("commands", "# default\ntpl\ntpl <path>\n")
        .write(
            "content/main.gmi",
            "# {{ .env.HOST }}\n{{ if index .env \"LANG\" }}lang={{ .env.LANG }}\n{{ end }}bye\n",
        )
        .write("content/about.gmi", "about {{ .env.IDENT }}\n");
    let gw = gateway_for(&capsule);

    let out = run(&gw, &request(ALICE, "")).await;
    assert_eq!(out.status, 0);
    assert_eq!(out.stdout, "# default\nbye\n");

    let req = request(ALICE, "").with_env(CallerEnv::new().with_var("LANG", "de_DE"));
    let out = run(&gw, &req).await;
    assert_eq!(out.stdout, "# default\nlang=de_DE\nbye\n");

    let out = run(&gw, &request(ALICE, "tpl about.gmi")).await;
    assert_eq!(out.status, 0);
    assert_eq!(out.stdout, format!("about {}\n", ALICE));
}

#[tokio::test]
async fn test_broken_document_writes_nothing_but_not_found() {
    let capsule = CapsuleDir::new();
    capsule
        .write("commands", "tpl <path>\n")
        .write("content/broken.gmi", "partial {{ if .env.HOST }} never closed\n");
    let gw = gateway_for(&capsule);

    let out = run(&gw, &request(ALICE, "tpl broken.gmi")).await;
    assert_eq!(out.status, 127);
    assert_eq!(out.stdout, NOT_FOUND_MESSAGE);

    let out = run(&gw, &request(ALICE, "tpl absent.gmi")).await;
    assert_eq!(out.status, 127);
    assert_eq!(out.stdout, NOT_FOUND_MESSAGE);
}

#[tokio::test]
async fn test_greeting_without_default_command() {
    let capsule = CapsuleDir::new();
    capsule.write("commands", "cat <path>\n");
    let req = request(ALICE, "").with_env(CallerEnv::new().with_var("LANG", "C"));
    let out = run(&gateway_for(&capsule), &req).await;

    assert_eq!(out.status, 0);
    assert_eq!(
        out.stdout,
        format!(
            "Welcome alice\nYour public key is {}\nYour environment: [LANG=C]\n",
            ALICE
        )
    );
}

#[tokio::test]
async fn test_bindings_file_maps_virtual_prefixes() {
    let capsule = CapsuleDir::new();
    capsule
        .write("commands", "cat <path>\n")
        .write("bindings", "# virtual:real\n/:content\n/shared:public\n")
        .write("content/notes.gmi", "content\n")
        .write("public/readme.txt", "public\n");
    let gw = gateway_for(&capsule);

    let out = run(&gw, &request(ALICE, "cat /shared/readme.txt")).await;
    assert_eq!(out.stdout, "public\n");

    let out = run(&gw, &request(ALICE, "cat notes.gmi")).await;
    assert_eq!(out.stdout, "content\n");
}

#[tokio::test]
async fn test_commands_file_changes_apply_to_next_session() {
    let capsule = CapsuleDir::new();
    capsule.write("commands", "echo first\n");
    let gw = gateway_for(&capsule);

    assert_eq!(run(&gw, &request(ALICE, "echo first")).await.status, 0);

    capsule.write("commands", "echo second\n");
    assert_eq!(run(&gw, &request(ALICE, "echo first")).await.status, 127);
    assert_eq!(run(&gw, &request(ALICE, "echo second")).await.stdout, "second\n");
}
