use assert_cmd::cargo::cargo_bin_cmd;

fn help_for(args: &[&str]) -> String {
    let mut cmd = cargo_bin_cmd!("touristctl");
    let output = cmd
        .args(args)
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8_lossy(&output).into_owned()
}

#[test]
fn top_level_help_lists_commands() {
    let text = help_for(&[]);
    for command in [
        "place", "list", "find", "open", "refresh", "clear", "delete",
        "viewport",
    ] {
        assert!(text.contains(command), "help missing '{command}'");
    }
    assert!(text.contains("--config"), "help missing --config");
    assert!(text.contains("--env-file"), "help missing --env-file");
}

#[test]
fn place_requires_coordinates() {
    let text = help_for(&["place"]);
    assert!(text.contains("--lat"));
    assert!(text.contains("--lon"));

    let mut cmd = cargo_bin_cmd!("touristctl");
    cmd.arg("place").arg("--lat").arg("1.0").assert().failure();
}

#[test]
fn viewport_set_documents_spans() {
    let text = help_for(&["viewport", "set"]);
    assert!(text.contains("--lat-delta"), "viewport set missing --lat-delta");
    assert!(text.contains("--lon-delta"), "viewport set missing --lon-delta");
}
