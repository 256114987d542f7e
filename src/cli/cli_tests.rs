use super::*;

fn parse(argv: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("hdtools").chain(argv.iter().copied())).unwrap()
}

#[test]
fn batch_command_with_filter() {
    let args = parse(&["active", "--locked", "-f", "inactive", "alice", "bob@clemson.edu"]);
    let (op, targets, label) = args.command.batch().unwrap();
    assert_eq!(op, Operation::Active { lockout_aware: true });
    assert_eq!(targets.usernames, vec!["alice", "bob@clemson.edu"]);
    assert_eq!(label, "inactive");
}

#[test]
fn global_flags_after_subcommand() {
    let args = parse(&["lockout", "alice", "-i", "users.tsv", "-p", "J", "--out-all", "report"]);
    assert_eq!(args.input, Some(PathBuf::from("users.tsv")));
    assert_eq!(args.print, Some(PrintArg::Json));
    assert_eq!(args.file_target(), Some(FileTarget::Pair(PathBuf::from("report"))));
}

#[test]
fn output_flags_are_exclusive() {
    let argv = ["hdtools", "search", "--out-plain", "a.txt", "--out-json", "a.json"];
    assert!(Args::try_parse_from(argv).is_err());
}

#[test]
fn interactive_commands_are_not_batches() {
    assert!(parse(&["cli"]).command.batch().is_none());
    assert!(parse(&["tui"]).command.batch().is_none());
    let args = parse(&["lastpass", "alice"]);
    assert_eq!(args.command.batch().map(|b| b.0), Some(Operation::LastPassword));
    assert_eq!(args.file_target(), None);
}
