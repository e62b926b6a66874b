//! Builtin command grammars, compiled in so completion works out of the
//! box. User spec files extend this set but never shadow it.

use crate::exec::generators::{
    docker_containers, docker_images, env_vars, git_branches, git_remotes, git_tags,
    npm_packages, npm_scripts,
};
use crate::spec::model::{ArgSpec, CommandSpec, SpecOption, Template};
use crate::spec::registry::{SpecOrigin, SpecRegistry};

pub fn register_builtins(registry: &mut SpecRegistry) {
    for spec in [
        git_spec(),
        docker_spec(),
        npm_spec(),
        cd_spec(),
        ls_spec(),
        cat_spec(),
        kill_spec(),
        echo_spec(),
    ] {
        registry.register(SpecOrigin::Builtin, spec);
    }
}

fn git_spec() -> CommandSpec {
    CommandSpec::new("git")
        .with_description("The stupid content tracker")
        .with_option(
            SpecOption::flag("-C")
                .with_description("Run as if started in the given path")
                .with_arg(ArgSpec::new("path").with_template(Template::Folders))
                .persistent(),
        )
        .with_option(
            SpecOption::flag("--no-pager")
                .with_description("Do not pipe output into a pager")
                .persistent(),
        )
        .with_option(SpecOption::flag("--version").with_description("Print the git version"))
        .with_subcommand(
            CommandSpec::new("status")
                .with_description("Show the working tree status")
                .with_priority(105)
                .with_option(SpecOption::new(["-s", "--short"]).with_description("Give output in short format"))
                .with_option(SpecOption::new(["-b", "--branch"]).with_description("Show branch information")),
        )
        .with_subcommand(
            CommandSpec::new("add")
                .with_description("Add file contents to the index")
                .with_priority(105)
                .with_option(SpecOption::new(["-p", "--patch"]).with_description("Interactively choose hunks"))
                .with_option(SpecOption::new(["-u", "--update"]).with_description("Update tracked files only"))
                .with_option(SpecOption::new(["-A", "--all"]).with_description("Add all changes"))
                .with_arg(
                    ArgSpec::new("pathspec")
                        .variadic()
                        .with_template(Template::Filepaths),
                ),
        )
        .with_subcommand(
            CommandSpec::new("commit")
                .with_description("Record changes to the repository")
                .with_priority(110)
                .with_option(
                    SpecOption::new(["-m", "--message"])
                        .with_description("Use the given commit message")
                        .with_arg(ArgSpec::new("message")),
                )
                .with_option(SpecOption::new(["-a", "--all"]).with_description("Commit all changed files"))
                .with_option(SpecOption::flag("--amend").with_description("Replace the tip of the current branch"))
                .with_option(SpecOption::flag("--no-edit").with_description("Keep the selected commit message"))
                .with_option(SpecOption::flag("--allow-empty-message").hide()),
        )
        .with_subcommand(
            CommandSpec::new("branch")
                .with_description("List, create, or delete branches")
                .with_option(SpecOption::new(["-d", "--delete"]).with_description("Delete a branch"))
                .with_option(SpecOption::new(["-m", "--move"]).with_description("Rename a branch"))
                .with_option(SpecOption::new(["-a", "--all"]).with_description("List remote and local branches"))
                .with_option(SpecOption::new(["-r", "--remotes"]).with_description("List remote branches"))
                .with_arg(ArgSpec::new("branch").optional().with_generator(git_branches())),
        )
        .with_subcommand(
            CommandSpec::new("checkout")
                .with_description("Switch branches or restore files")
                .with_option(
                    SpecOption::flag("-b")
                        .with_description("Create and switch to a new branch")
                        .with_arg(ArgSpec::new("new-branch")),
                )
                .with_option(SpecOption::new(["-f", "--force"]).with_description("Throw away local changes"))
                .with_arg(ArgSpec::new("branch").with_generator(git_branches())),
        )
        .with_subcommand(
            CommandSpec::new("push")
                .with_description("Update remote refs along with objects")
                .with_priority(110)
                .with_option(SpecOption::new(["-f", "--force"]).with_description("Force the update"))
                .with_option(SpecOption::new(["-u", "--set-upstream"]).with_description("Set upstream for the branch"))
                .with_option(SpecOption::flag("--tags").with_description("Push all tags"))
                .with_option(
                    SpecOption::new(["-d", "--delete"]).with_description("Delete the remote ref"),
                )
                .with_arg(ArgSpec::new("remote").with_generator(git_remotes()))
                .with_arg(ArgSpec::new("branch").optional().with_generator(git_branches())),
        )
        .with_subcommand(
            CommandSpec::new("pull")
                .with_description("Fetch and integrate from a remote")
                .with_priority(110)
                .with_option(SpecOption::new(["-r", "--rebase"]).with_description("Rebase instead of merge"))
                .with_option(SpecOption::flag("--ff-only").with_description("Only fast-forward"))
                .with_arg(ArgSpec::new("remote").optional().with_generator(git_remotes()))
                .with_arg(ArgSpec::new("branch").optional().with_generator(git_branches())),
        )
        .with_subcommand(
            CommandSpec::new("fetch")
                .with_description("Download objects and refs from a remote")
                .with_option(SpecOption::flag("--all").with_description("Fetch all remotes"))
                .with_option(SpecOption::new(["-p", "--prune"]).with_description("Prune gone remote branches"))
                .with_arg(ArgSpec::new("remote").optional().with_generator(git_remotes())),
        )
        .with_subcommand(
            CommandSpec::new("merge")
                .with_description("Join development histories together")
                .with_option(SpecOption::flag("--no-ff").with_description("Always create a merge commit"))
                .with_option(SpecOption::flag("--squash").with_description("Squash into a single commit"))
                .with_option(SpecOption::flag("--abort").with_description("Abort the current merge"))
                .with_arg(ArgSpec::new("branch").with_generator(git_branches())),
        )
        .with_subcommand(
            CommandSpec::new("rebase")
                .with_description("Reapply commits on top of another base")
                .with_option(SpecOption::new(["-i", "--interactive"]).with_description("Edit the todo list"))
                .with_option(
                    SpecOption::flag("--continue")
                        .with_description("Continue after resolving conflicts")
                        .exclusive_on(["--abort", "--skip"]),
                )
                .with_option(
                    SpecOption::flag("--abort")
                        .with_description("Abort and restore the original branch")
                        .exclusive_on(["--continue", "--skip"]),
                )
                .with_option(
                    SpecOption::flag("--skip")
                        .with_description("Skip the current patch")
                        .exclusive_on(["--continue", "--abort"]),
                )
                .with_option(
                    SpecOption::flag("--onto")
                        .with_description("Rebase onto the given base")
                        .with_arg(ArgSpec::new("newbase").with_generator(git_branches())),
                )
                .with_arg(ArgSpec::new("branch").optional().with_generator(git_branches())),
        )
        .with_subcommand(
            CommandSpec::new("log")
                .with_description("Show commit logs")
                .with_option(SpecOption::flag("--oneline").with_description("One commit per line"))
                .with_option(SpecOption::flag("--graph").with_description("Draw the commit graph"))
                .with_option(SpecOption::new(["-p", "--patch"]).with_description("Show diffs"))
                .with_option(
                    SpecOption::flag("-n")
                        .with_description("Limit the number of commits")
                        .with_arg(ArgSpec::new("number")),
                ),
        )
        .with_subcommand(
            CommandSpec::new("diff")
                .with_description("Show changes between commits and the tree")
                .with_option(SpecOption::flag("--staged").with_description("Diff against the index"))
                .with_option(SpecOption::flag("--stat").with_description("Show a diffstat"))
                .with_arg(
                    ArgSpec::new("path")
                        .optional()
                        .with_template(Template::Filepaths),
                ),
        )
        .with_subcommand(
            CommandSpec::new("tag")
                .with_description("Create, list, or delete tags")
                .with_option(SpecOption::new(["-d", "--delete"]).with_description("Delete a tag"))
                .with_option(SpecOption::new(["-a", "--annotate"]).with_description("Make an annotated tag"))
                .with_option(
                    SpecOption::flag("-m")
                        .with_description("Tag message")
                        .with_arg(ArgSpec::new("message")),
                )
                .with_arg(ArgSpec::new("tagname").optional().with_generator(git_tags())),
        )
        .with_subcommand(
            CommandSpec::new("remote")
                .with_description("Manage tracked repositories")
                .with_option(SpecOption::new(["-v", "--verbose"]).with_description("Show remote URLs"))
                .with_subcommand(
                    CommandSpec::new("add")
                        .with_description("Add a remote")
                        .with_arg(ArgSpec::new("name"))
                        .with_arg(ArgSpec::new("url")),
                )
                .with_subcommand(
                    CommandSpec::new("remove")
                        .with_description("Remove a remote")
                        .with_arg(ArgSpec::new("name").with_generator(git_remotes())),
                ),
        )
        .with_subcommand(
            CommandSpec::new("stash")
                .with_description("Stash away changes in a dirty tree")
                .with_subcommand(CommandSpec::new("list").with_description("List stash entries"))
                .with_subcommand(CommandSpec::new("pop").with_description("Apply and drop a stash entry"))
                .with_subcommand(CommandSpec::new("apply").with_description("Apply a stash entry"))
                .with_subcommand(CommandSpec::new("drop").with_description("Drop a stash entry"))
                .with_subcommand(
                    CommandSpec::new("push")
                        .with_description("Save local changes to a new stash")
                        .with_option(
                            SpecOption::flag("-m")
                                .with_description("Stash message")
                                .with_arg(ArgSpec::new("message")),
                        ),
                ),
        )
        .with_subcommand(
            // Plumbing: completes when typed, never offered in the menu.
            CommandSpec::new("rev-parse")
                .hide()
                .with_option(SpecOption::flag("--short"))
                .with_arg(ArgSpec::new("rev")),
        )
}

fn docker_spec() -> CommandSpec {
    CommandSpec::new("docker")
        .with_description("A self-sufficient runtime for containers")
        .with_option(SpecOption::new(["-D", "--debug"]).with_description("Enable debug mode"))
        .with_option(
            SpecOption::new(["-H", "--host"])
                .with_description("Daemon socket to connect to")
                .with_arg(ArgSpec::new("host")),
        )
        .with_option(SpecOption::flag("--version").with_description("Print version information"))
        .with_subcommand(
            CommandSpec::new("ps")
                .with_description("List containers")
                .with_option(SpecOption::new(["-a", "--all"]).with_description("Show stopped containers too"))
                .with_option(SpecOption::new(["-q", "--quiet"]).with_description("Only display IDs"))
                .with_option(SpecOption::new(["-s", "--size"]).with_description("Display total file sizes")),
        )
        .with_subcommand(
            CommandSpec::new("run")
                .with_description("Create and run a new container")
                .with_option(SpecOption::new(["-d", "--detach"]).with_description("Run in the background"))
                .with_option(SpecOption::new(["-i", "--interactive"]).with_description("Keep stdin open"))
                .with_option(SpecOption::new(["-t", "--tty"]).with_description("Allocate a pseudo-TTY"))
                .with_option(SpecOption::flag("--rm").with_description("Remove the container on exit"))
                .with_option(
                    SpecOption::new(["-p", "--publish"])
                        .with_description("Publish a container port")
                        .with_arg(ArgSpec::new("port"))
                        .repeatable(),
                )
                .with_option(
                    SpecOption::new(["-v", "--volume"])
                        .with_description("Bind mount a volume")
                        .with_arg(ArgSpec::new("volume"))
                        .repeatable(),
                )
                .with_option(
                    SpecOption::new(["-e", "--env"])
                        .with_description("Set an environment variable")
                        .with_arg(ArgSpec::new("env"))
                        .repeatable(),
                )
                .with_option(
                    SpecOption::flag("--name")
                        .with_description("Assign a name to the container")
                        .with_arg(ArgSpec::new("name")),
                )
                .with_arg(ArgSpec::new("image").with_generator(docker_images())),
        )
        .with_subcommand(
            CommandSpec::new("exec")
                .with_description("Execute a command in a running container")
                .with_option(SpecOption::new(["-i", "--interactive"]).with_description("Keep stdin open"))
                .with_option(SpecOption::new(["-t", "--tty"]).with_description("Allocate a pseudo-TTY"))
                .with_arg(ArgSpec::new("container").with_generator(docker_containers()))
                .with_arg(ArgSpec::new("command")),
        )
        .with_subcommand(
            CommandSpec::new("stop")
                .with_description("Stop running containers")
                .with_arg(
                    ArgSpec::new("container")
                        .variadic()
                        .with_generator(docker_containers()),
                ),
        )
        .with_subcommand(
            CommandSpec::new("start")
                .with_description("Start stopped containers")
                .with_arg(
                    ArgSpec::new("container")
                        .variadic()
                        .with_generator(docker_containers()),
                ),
        )
        .with_subcommand(
            CommandSpec::new("rm")
                .with_description("Remove containers")
                .with_option(SpecOption::new(["-f", "--force"]).with_description("Force removal"))
                .with_option(SpecOption::new(["-v", "--volumes"]).with_description("Remove anonymous volumes"))
                .with_arg(
                    ArgSpec::new("container")
                        .variadic()
                        .with_generator(docker_containers()),
                ),
        )
        .with_subcommand(
            CommandSpec::new("rmi")
                .with_description("Remove images")
                .with_option(SpecOption::new(["-f", "--force"]).with_description("Force removal"))
                .with_arg(ArgSpec::new("image").variadic().with_generator(docker_images())),
        )
        .with_subcommand(
            CommandSpec::new("images")
                .with_description("List images")
                .with_option(SpecOption::new(["-a", "--all"]).with_description("Show intermediate layers"))
                .with_option(SpecOption::new(["-q", "--quiet"]).with_description("Only display IDs")),
        )
        .with_subcommand(
            CommandSpec::new("pull")
                .with_description("Download an image from a registry")
                .with_arg(ArgSpec::new("image")),
        )
        .with_subcommand(
            CommandSpec::new("logs")
                .with_description("Fetch the logs of a container")
                .with_option(SpecOption::new(["-f", "--follow"]).with_description("Follow log output"))
                .with_option(SpecOption::new(["-t", "--timestamps"]).with_description("Show timestamps"))
                .with_option(
                    SpecOption::flag("--tail")
                        .with_description("Number of lines from the end")
                        .with_arg(ArgSpec::new("lines")),
                )
                .with_arg(ArgSpec::new("container").with_generator(docker_containers())),
        )
        .with_subcommand(
            CommandSpec::new("build")
                .with_description("Build an image from a Dockerfile")
                .with_option(
                    SpecOption::new(["-t", "--tag"])
                        .with_description("Name and optionally tag the image")
                        .with_arg(ArgSpec::new("name")),
                )
                .with_option(
                    SpecOption::new(["-f", "--file"])
                        .with_description("Name of the Dockerfile")
                        .with_arg(ArgSpec::new("file").with_template(Template::Files)),
                )
                .with_arg(ArgSpec::new("context").with_template(Template::Folders)),
        )
}

fn npm_spec() -> CommandSpec {
    CommandSpec::new("npm")
        .with_description("Node package manager")
        .with_option(SpecOption::new(["-v", "--version"]).with_description("Print the npm version"))
        .with_subcommand(
            CommandSpec::new("install")
                .with_description("Install packages")
                .with_alias("i")
                .with_alias("add")
                .with_option(SpecOption::new(["-D", "--save-dev"]).with_description("Save to devDependencies"))
                .with_option(SpecOption::new(["-g", "--global"]).with_description("Install globally"))
                .with_option(SpecOption::new(["-E", "--save-exact"]).with_description("Pin the exact version"))
                .with_arg(
                    ArgSpec::new("package")
                        .optional()
                        .variadic()
                        .with_generator(npm_packages()),
                ),
        )
        .with_subcommand(
            CommandSpec::new("uninstall")
                .with_description("Remove packages")
                .with_alias("rm")
                .with_alias("un")
                .with_option(SpecOption::new(["-g", "--global"]).with_description("Uninstall a global package"))
                .with_arg(
                    ArgSpec::new("package")
                        .variadic()
                        .with_generator(npm_packages()),
                ),
        )
        .with_subcommand(
            CommandSpec::new("run")
                .with_description("Run a script defined in package.json")
                .with_alias("run-script")
                .with_arg(ArgSpec::new("script").with_generator(npm_scripts())),
        )
        .with_subcommand(
            CommandSpec::new("init")
                .with_description("Create a package.json file")
                .with_option(SpecOption::new(["-y", "--yes"]).with_description("Accept all defaults")),
        )
        .with_subcommand(
            CommandSpec::new("test")
                .with_description("Run the test script")
                .with_alias("t"),
        )
        .with_subcommand(
            CommandSpec::new("publish")
                .with_description("Publish the package")
                .with_option(SpecOption::flag("--dry-run").with_description("Report what would be published"))
                .with_option(
                    SpecOption::flag("--tag")
                        .with_description("Register with the given dist-tag")
                        .with_arg(ArgSpec::new("tag")),
                ),
        )
        .with_subcommand(CommandSpec::new("ci").with_description("Clean install from the lockfile"))
}

fn cd_spec() -> CommandSpec {
    CommandSpec::new("cd")
        .with_description("Change the working directory")
        .with_option(SpecOption::flag("-L").with_description("Follow symbolic links"))
        .with_option(SpecOption::flag("-P").with_description("Use the physical directory structure"))
        .with_arg(ArgSpec::new("directory").with_template(Template::Folders))
}

fn ls_spec() -> CommandSpec {
    CommandSpec::new("ls")
        .with_description("List directory contents")
        .with_option(SpecOption::flag("-l").with_description("Long listing format"))
        .with_option(SpecOption::new(["-a", "--all"]).with_description("Include dotfiles"))
        .with_option(SpecOption::new(["-h", "--human-readable"]).with_description("Human readable sizes"))
        .with_option(SpecOption::new(["-R", "--recursive"]).with_description("List subdirectories recursively"))
        .with_option(SpecOption::flag("-t").with_description("Sort by modification time"))
        .with_option(SpecOption::flag("-S").with_description("Sort by file size"))
        .with_arg(
            ArgSpec::new("path")
                .optional()
                .variadic()
                .with_template(Template::Filepaths),
        )
}

fn cat_spec() -> CommandSpec {
    CommandSpec::new("cat")
        .with_description("Concatenate and print files")
        .with_option(SpecOption::new(["-n", "--number"]).with_description("Number all output lines"))
        .with_option(
            SpecOption::new(["-b", "--number-nonblank"]).with_description("Number nonempty lines"),
        )
        .with_option(SpecOption::new(["-A", "--show-all"]).with_description("Show nonprinting characters"))
        .with_arg(
            ArgSpec::new("file")
                .variadic()
                .with_template(Template::Filepaths),
        )
}

fn kill_spec() -> CommandSpec {
    CommandSpec::new("kill")
        .with_description("Send a signal to a process")
        .with_option(
            SpecOption::flag("-s")
                .with_description("Signal to send")
                .with_arg(ArgSpec::new("signal").with_suggestions([
                    "TERM", "KILL", "INT", "HUP", "QUIT", "USR1", "USR2", "STOP", "CONT",
                ])),
        )
        .with_option(SpecOption::new(["-l", "--list"]).with_description("List signal names"))
        .with_option(SpecOption::flag("-9").with_description("Send SIGKILL"))
        .with_arg(ArgSpec::new("pid").variadic())
}

fn echo_spec() -> CommandSpec {
    CommandSpec::new("echo")
        .with_description("Write arguments to standard output")
        .with_option(SpecOption::flag("-n").with_description("Do not output a trailing newline"))
        .with_option(SpecOption::flag("-e").with_description("Enable backslash escapes"))
        .with_option(SpecOption::flag("-E").with_description("Disable backslash escapes"))
        .with_arg(ArgSpec::new("text").optional().variadic().with_generator(env_vars()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SpecRegistry {
        let mut registry = SpecRegistry::new();
        register_builtins(&mut registry);
        registry
    }

    #[test]
    fn test_all_builtins_registered() {
        let registry = registry();
        let count = registry.count();
        assert_eq!(count.builtin, 8);
        assert_eq!(count.dynamic, 0);
        for name in ["git", "docker", "npm", "cd", "ls", "cat", "kill", "echo"] {
            assert!(registry.contains(name), "missing builtin {name}");
        }
    }

    #[test]
    fn test_git_commit_message_takes_value() {
        let registry = registry();
        let git = registry.get("git").unwrap();
        let commit = git
            .subcommands
            .iter()
            .find(|s| s.name == "commit")
            .unwrap();
        let message = commit
            .options
            .iter()
            .find(|o| o.matches_name("-m"))
            .unwrap();
        assert!(message.takes_value());
        assert!(message.matches_name("--message"));
    }

    #[test]
    fn test_git_persistent_flags_marked() {
        let registry = registry();
        let git = registry.get("git").unwrap();
        assert!(git.options.iter().any(|o| o.matches_name("-C") && o.persistent));
        assert!(!git.options.iter().any(|o| o.matches_name("--version") && o.persistent));
    }

    #[test]
    fn test_git_stash_nests_subcommands() {
        let registry = registry();
        let git = registry.get("git").unwrap();
        let stash = git.subcommands.iter().find(|s| s.name == "stash").unwrap();
        assert!(stash.subcommands.iter().any(|s| s.name == "pop"));
        assert!(stash.subcommands.iter().any(|s| s.name == "push"));
    }

    #[test]
    fn test_plumbing_subcommand_hidden() {
        let registry = registry();
        let git = registry.get("git").unwrap();
        let rev_parse = git
            .subcommands
            .iter()
            .find(|s| s.name == "rev-parse")
            .unwrap();
        assert!(rev_parse.hidden);
    }

    #[test]
    fn test_rebase_recovery_flags_exclusive() {
        let registry = registry();
        let git = registry.get("git").unwrap();
        let rebase = git.subcommands.iter().find(|s| s.name == "rebase").unwrap();
        let cont = rebase
            .options
            .iter()
            .find(|o| o.matches_name("--continue"))
            .unwrap();
        assert!(cont.exclusive_on.contains(&"--abort".to_string()));
        assert!(cont.exclusive_on.contains(&"--skip".to_string()));
    }

    #[test]
    fn test_npm_install_aliases() {
        let registry = registry();
        let npm = registry.get("npm").unwrap();
        let install = npm
            .subcommands
            .iter()
            .find(|s| s.name == "install")
            .unwrap();
        assert!(install.matches_name("i"));
        assert!(install.matches_name("add"));
        assert!(!install.matches_name("remove"));
    }

    #[test]
    fn test_path_templates_wired() {
        let registry = registry();
        let cd = registry.get("cd").unwrap();
        assert_eq!(cd.args[0].template, Some(Template::Folders));

        let ls = registry.get("ls").unwrap();
        assert_eq!(ls.args[0].template, Some(Template::Filepaths));
        assert!(ls.args[0].variadic);
    }

    #[test]
    fn test_kill_signal_suggestions_static() {
        let registry = registry();
        let kill = registry.get("kill").unwrap();
        let signal = kill.options.iter().find(|o| o.matches_name("-s")).unwrap();
        assert!(signal.args[0].suggestions.contains(&"KILL".to_string()));
    }
}
