use stratus::api::StratusCli;
use stratus::error::Result;
use stratus::output::OutputSink;
use stratus::plugin::{CliRoot, Plugin};

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let cli = match StratusCli::from_plugins(&manifest()) {
        Ok(cli) => cli,
        Err(error) => {
            eprintln!("Error: {}", error);
            return 1;
        }
    };

    let argv: Vec<String> = std::env::args().skip(1).collect();
    cli.run(&argv, OutputSink::stdio)
}

/// The explicit plugin manifest. Service modules are added here, in the
/// order their commands should appear in help output.
fn manifest() -> Vec<Box<dyn Plugin>> {
    vec![Box::new(VersionPlugin)]
}

/// Built-in `version` command reporting the binary version and the git
/// metadata embedded by build.rs.
struct VersionPlugin;

impl Plugin for VersionPlugin {
    fn name(&self) -> &str {
        "version"
    }

    fn init(&self, root: &mut CliRoot<'_>) -> Result<()> {
        root.command("version")?
            .description("Show the stratus version")
            .execute(|inv, done| {
                let version = env!("CARGO_PKG_VERSION");
                let hash = env!("GIT_HASH");
                let date = env!("GIT_COMMIT_DATE");
                if inv.sink.is_json() {
                    inv.sink.json(&serde_json::json!({
                        "version": version,
                        "commit": hash,
                        "commit_date": date,
                    }));
                } else if hash.is_empty() {
                    inv.sink.raw(&format!("stratus {}", version));
                } else {
                    inv.sink
                        .raw(&format!("stratus {} ({} {})", version, hash, date));
                }
                done.succeed();
            });
        Ok(())
    }
}
