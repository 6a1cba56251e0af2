use super::*;
use tempfile::TempDir;

fn fake_proc(entries: &[(u32, &str)]) -> TempDir {
    let root = TempDir::new().unwrap();
    for (pid, target) in entries {
        let ns_dir = root.path().join(pid.to_string()).join("ns");
        std::fs::create_dir_all(&ns_dir).unwrap();
        std::os::unix::fs::symlink(target, ns_dir.join("pid")).unwrap();
    }
    root
}

#[test]
fn parse_ns_link_test() {
    assert_eq!(Some(4026532281), parse_ns_link("pid:[4026532281]"));
    assert_eq!(Some(0), parse_ns_link("pid:[0]"));

    assert_eq!(None, parse_ns_link("pid:[]"));
    assert_eq!(None, parse_ns_link("pid:[123"));
    assert_eq!(None, parse_ns_link("net:[4026532281]"));
    assert_eq!(None, parse_ns_link("pid:[12a3]"));
    assert_eq!(None, parse_ns_link(""));
}

#[test]
fn pid_namespace_test() {
    let root = fake_proc(&[(4242, "pid:[4026532281]")]);

    assert_eq!(4026532281, pid_namespace(root.path(), 4242).unwrap());
    // the resolver is pure, a second read sees the same inode
    assert_eq!(4026532281, pid_namespace(root.path(), 4242).unwrap());
}

#[test]
fn pid_namespace_missing_entry_test() {
    let root = fake_proc(&[]);

    let error = pid_namespace(root.path(), 4242).unwrap_err();
    assert!(matches!(error, ProcError::NotFound(4242)));
}

#[test]
fn pid_namespace_malformed_link_test() {
    let root = fake_proc(&[(100, "pid:[oops]"), (101, "mnt:[4026532281]")]);

    assert!(matches!(pid_namespace(root.path(), 100).unwrap_err(), ProcError::Malformed(100, _)));
    assert!(matches!(pid_namespace(root.path(), 101).unwrap_err(), ProcError::Malformed(101, _)));
}
