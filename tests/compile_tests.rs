//! Expansion of blocks, includes, roles and playbook imports

mod common;

use common::{compile_playbook, task_names, TestProject};
use rustle_expand::{CompileError, LoadError};

const DEBUG_PLAY: &str = "\
- name: web
  hosts: all
  tasks:
    - name: A
      include_tasks: a.yml
";

#[test]
fn test_nested_includes_expand_in_declaration_order() {
    let project = TestProject::with_files(&[
        ("playbook.yml", DEBUG_PLAY),
        (
            "a.yml",
            "- name: A1\n  debug:\n    msg: a\n- name: include B\n  include_tasks: b.yml\n",
        ),
        ("b.yml", "- name: B1\n  debug:\n    msg: b\n"),
    ]);

    let (loader, tasks) = compile_playbook(&project, "playbook.yml").unwrap();
    let graph = loader.graph();
    assert_eq!(task_names(graph, &tasks), vec!["A1", "B1"]);

    let a1_parent = graph.task(tasks[0]).parent().unwrap();
    assert_eq!(graph.task(a1_parent).name(), Some("A"));

    let b1_ancestors = task_names(graph, &graph.task_ancestors(tasks[1]));
    assert_eq!(b1_ancestors, vec!["include B", "A"]);
}

#[test]
fn test_included_tasks_carry_their_own_file() {
    let project = TestProject::with_files(&[
        ("playbook.yml", DEBUG_PLAY),
        ("a.yml", "- name: A1\n  debug:\n    msg: a\n"),
    ]);

    let (loader, tasks) = compile_playbook(&project, "playbook.yml").unwrap();
    let graph = loader.graph();
    let metadata = graph.task_metadata(tasks[0]);
    assert_eq!(metadata.path(), project.path("a.yml"));

    let chain = graph.describe(graph.task(tasks[0]).metadata());
    assert!(chain.contains("(play \"web\")"), "{chain}");
    assert!(chain.contains("(task \"A\")"), "{chain}");
}

#[test]
fn test_free_form_and_structured_includes_resolve_identically() {
    let project = TestProject::with_files(&[
        (
            "playbook.yml",
            "\
- hosts: all
  tasks:
    - include_tasks: common.yml
    - include_tasks:
        file: common.yml
    - ansible.builtin.import_tasks: common.yml
",
        ),
        ("common.yml", "- name: C\n  command: uptime\n"),
    ]);

    let (loader, tasks) = compile_playbook(&project, "playbook.yml").unwrap();
    let graph = loader.graph();
    assert_eq!(task_names(graph, &tasks), vec!["C", "C", "C"]);
    let paths: Vec<_> = tasks
        .iter()
        .map(|&task| graph.task_metadata(task).path().to_path_buf())
        .collect();
    assert!(paths.iter().all(|path| *path == project.path("common.yml")));
}

#[test]
fn test_templated_include_target() {
    let project = TestProject::with_files(&[
        (
            "playbook.yml",
            "\
- hosts: all
  vars:
    flavor: debian
  tasks:
    - include_tasks: \"{{ flavor }}.yml\"
",
        ),
        ("debian.yml", "- name: apt update\n  apt:\n    update_cache: true\n"),
    ]);

    let (loader, tasks) = compile_playbook(&project, "playbook.yml").unwrap();
    assert_eq!(task_names(loader.graph(), &tasks), vec!["apt update"]);
}

#[test]
fn test_include_resolves_relative_to_including_file() {
    let project = TestProject::with_files(&[
        (
            "playbook.yml",
            "- hosts: all\n  tasks:\n    - include_tasks: tasks/main.yml\n",
        ),
        ("tasks/main.yml", "- include_tasks: setup.yml\n"),
        ("tasks/setup.yml", "- name: setup\n  command: make\n"),
    ]);

    let (loader, tasks) = compile_playbook(&project, "playbook.yml").unwrap();
    assert_eq!(task_names(loader.graph(), &tasks), vec!["setup"]);
}

#[test]
fn test_nested_blocks_flatten_in_order() {
    let project = TestProject::with_files(&[(
        "playbook.yml",
        "\
- hosts: all
  tasks:
    - name: outer
      block:
        - name: one
          command: echo 1
        - block:
            - name: two
              command: echo 2
            - name: three
              command: echo 3
    - name: four
      command: echo 4
",
    )]);

    let (loader, tasks) = compile_playbook(&project, "playbook.yml").unwrap();
    let graph = loader.graph();
    assert_eq!(task_names(graph, &tasks), vec!["one", "two", "three", "four"]);
    assert_eq!(
        task_names(graph, &graph.task_ancestors(tasks[1])),
        vec!["-", "outer"]
    );
}

#[test]
fn test_play_sections_then_roles() {
    let project = TestProject::with_files(&[
        (
            "playbook.yml",
            "\
- hosts: all
  roles:
    - web
  post_tasks:
    - name: post
      command: echo post
  tasks:
    - name: task
      command: echo task
  pre_tasks:
    - name: pre
      command: echo pre
",
        ),
        ("roles/web/tasks/main.yml", "- name: web\n  command: echo web\n"),
    ]);

    let (loader, tasks) = compile_playbook(&project, "playbook.yml").unwrap();
    assert_eq!(
        task_names(loader.graph(), &tasks),
        vec!["pre", "task", "post", "web"]
    );
}

#[test]
fn test_role_dependencies_compile_before_role() {
    let project = TestProject::with_files(&[
        ("playbook.yml", "- hosts: all\n  roles:\n    - app\n"),
        (
            "roles/app/meta/main.yml",
            "dependencies:\n  - common\n  - role: db\n    vars:\n      db_port: 5432\n",
        ),
        ("roles/app/tasks/main.yml", "- name: app\n  command: echo app\n"),
        ("roles/common/tasks/main.yml", "- name: common\n  command: echo common\n"),
        ("roles/db/meta/main.yml", "dependencies:\n  - common\n"),
        ("roles/db/tasks/main.yml", "- name: db\n  command: echo db\n"),
    ]);

    let (loader, tasks) = compile_playbook(&project, "playbook.yml").unwrap();
    assert_eq!(
        task_names(loader.graph(), &tasks),
        vec!["common", "common", "db", "app"]
    );
}

#[test]
fn test_include_role_forms() {
    let project = TestProject::with_files(&[
        (
            "playbook.yml",
            "\
- hosts: all
  tasks:
    - name: free form
      include_role: web
    - name: structured
      ansible.builtin.import_role:
        name: web
        tasks_from: install.yml
",
        ),
        ("roles/web/tasks/main.yml", "- name: web main\n  command: echo main\n"),
        (
            "roles/web/tasks/install.yml",
            "- name: web install\n  command: echo install\n",
        ),
    ]);

    let (loader, tasks) = compile_playbook(&project, "playbook.yml").unwrap();
    let graph = loader.graph();
    assert_eq!(task_names(graph, &tasks), vec!["web main", "web install"]);

    let included_by = graph.task(tasks[1]).parent().unwrap();
    assert_eq!(graph.task(included_by).name(), Some("structured"));
    assert_eq!(graph.role(graph.task(tasks[1]).role().unwrap()).name(), "web");
}

#[test]
fn test_import_playbook_replaces_play() {
    let project = TestProject::with_files(&[
        (
            "site.yml",
            "\
- import_playbook: playbooks/web.yml
- hosts: db
  tasks:
    - name: db task
      command: echo db
",
        ),
        (
            "playbooks/web.yml",
            "- hosts: web\n  tasks:\n    - name: web task\n      command: echo web\n",
        ),
    ]);

    let (loader, tasks) = compile_playbook(&project, "site.yml").unwrap();
    assert_eq!(task_names(loader.graph(), &tasks), vec!["web task", "db task"]);
}

#[test]
fn test_cyclic_role_dependency_fails() {
    let project = TestProject::with_files(&[
        ("playbook.yml", "- hosts: all\n  roles:\n    - a\n"),
        ("roles/a/meta/main.yml", "dependencies:\n  - b\n"),
        ("roles/a/tasks/main.yml", "- name: a\n  command: echo a\n"),
        ("roles/b/meta/main.yml", "dependencies:\n  - a\n"),
        ("roles/b/tasks/main.yml", "- name: b\n  command: echo b\n"),
    ]);

    let error = compile_playbook(&project, "playbook.yml").unwrap_err();
    match error {
        CompileError::Load(LoadError::CyclicDependency { cycle }) => {
            assert_eq!(cycle, vec!["a", "b", "a"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_self_including_task_file_fails() {
    let project = TestProject::with_files(&[
        (
            "playbook.yml",
            "- hosts: all\n  tasks:\n    - include_tasks: loop.yml\n",
        ),
        ("loop.yml", "- name: again\n  include_tasks: loop.yml\n"),
    ]);

    let error = compile_playbook(&project, "playbook.yml").unwrap_err();
    match error {
        CompileError::CyclicInclude { chain } => {
            assert_eq!(chain.len(), 2);
            assert_eq!(chain[0], chain[1]);
            assert!(chain[0].ends_with("loop.yml"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_self_importing_playbook_fails() {
    let project = TestProject::with_files(&[("site.yml", "- import_playbook: site.yml\n")]);

    let error = compile_playbook(&project, "site.yml").unwrap_err();
    assert!(matches!(error, CompileError::CyclicInclude { .. }), "{error}");
}

#[test]
fn test_missing_include_reports_including_task() {
    let project = TestProject::with_files(&[(
        "playbook.yml",
        "\
- name: web
  hosts: all
  tasks:
    - name: include missing
      include_tasks: missing.yml
",
    )]);

    let error = compile_playbook(&project, "playbook.yml").unwrap_err();
    match error {
        CompileError::IncludeFailed {
            chain,
            target,
            source,
        } => {
            assert!(chain.contains("include missing"), "{chain}");
            assert!(target.ends_with("missing.yml"), "{target}");
            assert!(matches!(*source, CompileError::Load(LoadError::Io { .. })));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_invalid_include_parameters() {
    let project = TestProject::with_files(&[(
        "playbook.yml",
        "- hosts: all\n  tasks:\n    - include_role:\n        tasks_from: x\n",
    )]);

    let error = compile_playbook(&project, "playbook.yml").unwrap_err();
    match error {
        CompileError::IncludeFailed { target, source, .. } => {
            assert_eq!(target, "include_role");
            assert!(
                matches!(&*source, CompileError::InvalidIncludeParams { action, .. } if action == "include_role"),
                "{source}"
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unrenderable_include_target_reports_render_failure() {
    let project = TestProject::with_files(&[(
        "playbook.yml",
        "\
- hosts: all
  vars:
    os: Debian
  tasks:
    - name: per os
      include_tasks: \"{{ os | lower }}.yml\"
",
    )]);

    let error = compile_playbook(&project, "playbook.yml").unwrap_err();
    match error {
        CompileError::IncludeFailed { chain, source, .. } => {
            assert!(chain.contains("per os"), "{chain}");
            match *source {
                CompileError::InvalidIncludeParams { reason, .. } => {
                    assert!(reason.contains("failed to render"), "{reason}");
                }
                other => panic!("unexpected source: {other}"),
            }
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_variable_failure_while_resolving_include_names_the_task() {
    let project = TestProject::with_files(&[
        (
            "playbook.yml",
            "\
- hosts: all
  vars_files:
    - missing.yml
  tasks:
    - name: the include
      include_tasks: a.yml
",
        ),
        ("a.yml", "- name: A1\n  command: echo\n"),
    ]);

    let error = compile_playbook(&project, "playbook.yml").unwrap_err();
    match error {
        CompileError::IncludeFailed { chain, source, .. } => {
            assert!(chain.contains("the include"), "{chain}");
            assert!(matches!(
                *source,
                CompileError::Load(LoadError::VarsFileRead { .. })
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_role_includes_resolve_relative_to_including_file() {
    let project = TestProject::with_files(&[
        ("playbook.yml", "- hosts: all\n  roles:\n    - test\n"),
        (
            "roles/test/tasks/main.yaml",
            "\
- name: A
  command: echo a
- name: include B
  include_tasks: included.yaml
- name: include C
  include_tasks: ../../test2/tasks/main.yaml
",
        ),
        ("roles/test/tasks/included.yaml", "- name: B\n  command: echo b\n"),
        ("roles/test2/tasks/main.yaml", "- name: C\n  command: echo c\n"),
    ]);

    let (loader, tasks) = compile_playbook(&project, "playbook.yml").unwrap();
    let graph = loader.graph();
    assert_eq!(task_names(graph, &tasks), vec!["A", "B", "C"]);

    assert_eq!(graph.task(tasks[0]).parent(), None);
    let parent_names: Vec<Option<&str>> = tasks[1..]
        .iter()
        .map(|&task| graph.task(graph.task(task).parent().unwrap()).name())
        .collect();
    assert_eq!(parent_names, vec![Some("include B"), Some("include C")]);
    assert_eq!(
        graph.task_metadata(tasks[2]).path(),
        project.path("roles/test/tasks/../../test2/tasks/main.yaml")
    );
}

#[test]
fn test_missing_included_role_fails() {
    let project = TestProject::with_files(&[(
        "playbook.yml",
        "- hosts: all\n  tasks:\n    - name: ghost\n      include_role:\n        name: ghost\n",
    )]);

    let error = compile_playbook(&project, "playbook.yml").unwrap_err();
    match error {
        CompileError::IncludeFailed { target, source, .. } => {
            assert_eq!(target, "role ghost");
            assert!(matches!(
                *source,
                CompileError::Load(LoadError::RoleNotFound { .. })
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}
