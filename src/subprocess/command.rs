/// An executable name plus its ordered argument list. Immutable once built;
/// the spawn layer never rewrites what the builders produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ProcessCommand {
    /// Single-line rendering used in log output.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

pub struct ProcessCommandBuilder {
    command: ProcessCommand,
}

impl ProcessCommandBuilder {
    pub fn new(program: &str) -> Self {
        Self {
            command: ProcessCommand {
                program: program.to_string(),
                args: Vec::new(),
            },
        }
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.command.args.push(arg.to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.command
            .args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    pub fn build(self) -> ProcessCommand {
        self.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_args_in_order() {
        let command = ProcessCommandBuilder::new("zfs")
            .arg("send")
            .args(["-I", "tank/data@s1"])
            .arg("tank/data@s2")
            .build();

        assert_eq!(command.program, "zfs");
        assert_eq!(command.args, vec!["send", "-I", "tank/data@s1", "tank/data@s2"]);
    }

    #[test]
    fn test_display_includes_program_and_args() {
        let command = ProcessCommandBuilder::new("mbuffer")
            .args(["-I", "9000"])
            .build();

        assert_eq!(command.display(), "mbuffer -I 9000");
    }

    #[test]
    fn test_display_bare_program() {
        let command = ProcessCommandBuilder::new("zfs").build();
        assert_eq!(command.display(), "zfs");
    }
}
