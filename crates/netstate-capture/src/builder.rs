//! Snapshot building
//!
//! Runs every section (or text device reply) through a [`TableParser`]. A
//! parse miss keeps the raw text as an unparsable result; parsed results keep
//! it too. JSON replies are kept as structured results without parsing.
//! Order and repeated commands are preserved.

use crate::device::{CommandOutput, DeviceError, DeviceQuery, Encoding};
use crate::parser::TableParser;
use netstate_core::{CommandResult, Section, Snapshot};

/// Builds snapshots with one parser for one vendor
pub struct SnapshotBuilder<'p> {
    parser: &'p dyn TableParser,
    vendor: String,
}

impl<'p> SnapshotBuilder<'p> {
    pub fn new(parser: &'p dyn TableParser, vendor: impl Into<String>) -> Self {
        Self {
            parser,
            vendor: vendor.into(),
        }
    }

    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    fn result_for(&self, command: &str, raw_text: String) -> CommandResult {
        match self.parser.parse(command, &self.vendor, &raw_text) {
            Ok(table) => CommandResult::parsed(command, table, raw_text),
            Err(miss) => {
                tracing::debug!(command, reason = %miss, "keeping raw text");
                CommandResult::unparsable(command, raw_text)
            }
        }
    }

    /// Build a snapshot from segmented transcript sections
    pub fn build(&self, source_id: impl Into<String>, sections: &[Section]) -> Snapshot {
        let results = sections
            .iter()
            .map(|section| self.result_for(&section.command, section.text()))
            .collect();

        finish(Snapshot::new(source_id).with_results(results))
    }

    fn result_for_reply(&self, reply: &CommandOutput) -> CommandResult {
        match reply.encoding {
            Encoding::Text => self.result_for(&reply.command, reply.output.clone()),
            Encoding::Json => match serde_json::from_str(&reply.output) {
                Ok(value) => CommandResult::structured(&reply.command, value),
                Err(e) => {
                    tracing::warn!(command = %reply.command, error = %e, "reply is not valid JSON");
                    CommandResult::unparsable(&reply.command, reply.output.clone())
                }
            },
        }
    }

    /// Build a snapshot from device replies
    pub fn build_from_outputs(
        &self,
        source_id: impl Into<String>,
        outputs: &[CommandOutput],
    ) -> Snapshot {
        let results = outputs
            .iter()
            .map(|reply| self.result_for_reply(reply))
            .collect();

        finish(Snapshot::new(source_id).with_results(results))
    }

    /// Query a device for `commands` as text and build a snapshot named after it
    pub async fn capture(
        &self,
        device: &dyn DeviceQuery,
        commands: &[String],
    ) -> Result<Snapshot, DeviceError> {
        self.capture_with(device, commands, Encoding::Text).await
    }

    /// Query a device for `commands` in the given encoding
    pub async fn capture_with(
        &self,
        device: &dyn DeviceQuery,
        commands: &[String],
        encoding: Encoding,
    ) -> Result<Snapshot, DeviceError> {
        tracing::debug!(
            device = device.name(),
            commands = commands.len(),
            %encoding,
            "querying device"
        );
        let outputs = device.fetch(commands, encoding).await?;

        if outputs.len() != commands.len() {
            return Err(DeviceError::InvalidResponse(format!(
                "asked for {} commands, got {} replies",
                commands.len(),
                outputs.len()
            )));
        }

        Ok(self.build_from_outputs(device.name(), &outputs))
    }
}

fn finish(snapshot: Snapshot) -> Snapshot {
    tracing::info!(
        source = %snapshot.source_id,
        commands = snapshot.len(),
        parsed = snapshot.parsed_count(),
        "built snapshot"
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ReplayDevice;
    use crate::parser::RegexTableParser;
    use netstate_core::ParseStatus;
    use pretty_assertions::assert_eq;

    fn parser() -> RegexTableParser {
        RegexTableParser::new()
            .with_template(
                "show ip arp",
                r"^(?P<ADDRESS>[\d.]+)\s+(?P<MAC>\S+)\s+(?P<INTERFACE>\S+)$",
            )
            .unwrap()
    }

    fn section(order_index: usize, command: &str, body: &[&str]) -> Section {
        Section {
            order_index,
            command: command.to_string(),
            boundary: format!("------------- {} -------------", command),
            raw_text: body.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn misses_keep_raw_text() {
        let parser = parser();
        let builder = SnapshotBuilder::new(&parser, "Arista");
        let sections = vec![
            section(0, "show clock", &["Thu Sep 28 00:50:37 2017"]),
            section(1, "show ip arp", &["10.0.0.1 0011.2233.4455 Ethernet1"]),
        ];

        let snapshot = builder.build("carcore3", &sections);

        assert_eq!(snapshot.source_id, "carcore3");
        assert_eq!(snapshot.commands(), vec!["show clock", "show ip arp"]);
        assert_eq!(snapshot.results[0].status(), ParseStatus::Unparsable);
        assert_eq!(snapshot.results[0].raw_text(), "Thu Sep 28 00:50:37 2017");
        assert!(snapshot.results[0].table().is_none());
        assert_eq!(snapshot.results[1].status(), ParseStatus::Parsed);
        assert_eq!(snapshot.results[1].raw_text(), "10.0.0.1 0011.2233.4455 Ethernet1");
        assert_eq!(snapshot.parsed_count(), 1);
    }

    #[test]
    fn repeated_commands_are_not_merged() {
        let parser = parser();
        let builder = SnapshotBuilder::new(&parser, "Arista");
        let sections = vec![
            section(0, "show ip arp", &["10.0.0.1 0011.2233.4455 Ethernet1"]),
            section(1, "show ip arp", &["10.0.0.2 0011.2233.4466 Ethernet2"]),
        ];

        let snapshot = builder.build("carcore3", &sections);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(
            snapshot.results[1].table().unwrap().value(0, "ADDRESS"),
            Some("10.0.0.2")
        );
    }

    #[tokio::test]
    async fn capture_uses_device_name_and_order() {
        let parser = parser();
        let builder = SnapshotBuilder::new(&parser, "Arista");
        let device = ReplayDevice::new("carcore3")
            .with_output("show ip arp", "10.0.0.1 0011.2233.4455 Ethernet1")
            .with_output("show clock", "now");

        let commands = vec!["show clock".to_string(), "show ip arp".to_string()];
        let snapshot = builder.capture(&device, &commands).await.unwrap();

        assert_eq!(snapshot.source_id, "carcore3");
        assert_eq!(snapshot.commands(), vec!["show clock", "show ip arp"]);
        assert_eq!(snapshot.parsed_count(), 1);
    }

    #[tokio::test]
    async fn capture_propagates_device_errors() {
        let parser = parser();
        let builder = SnapshotBuilder::new(&parser, "Arista");
        let device = ReplayDevice::new("carcore3");

        let err = builder
            .capture(&device, &["show ip arp".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, DeviceError::UnknownCommand(_)));
    }

    /// Answers every command with the same JSON document
    struct JsonDevice;

    #[async_trait::async_trait]
    impl DeviceQuery for JsonDevice {
        fn name(&self) -> &str {
            "carcore3"
        }

        async fn fetch(
            &self,
            commands: &[String],
            encoding: Encoding,
        ) -> Result<Vec<CommandOutput>, DeviceError> {
            Ok(commands
                .iter()
                .map(|command| CommandOutput {
                    command: command.clone(),
                    encoding,
                    output: r#"{"ipV4Neighbors": [{"address": "10.0.0.1"}]}"#.to_string(),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn json_replies_skip_the_parser() {
        let parser = parser();
        let builder = SnapshotBuilder::new(&parser, "Arista");

        let snapshot = builder
            .capture_with(&JsonDevice, &["show ip arp".to_string()], Encoding::Json)
            .await
            .unwrap();

        let arp = &snapshot.results[0];
        assert_eq!(arp.status(), ParseStatus::Unparsable);
        assert_eq!(
            arp.structured_output().unwrap()["ipV4Neighbors"][0]["address"],
            "10.0.0.1"
        );
    }

    #[test]
    fn invalid_json_reply_keeps_its_text() {
        let parser = parser();
        let builder = SnapshotBuilder::new(&parser, "Arista");
        let reply = CommandOutput {
            command: "show ip arp".into(),
            encoding: Encoding::Json,
            output: "% Invalid input".into(),
        };

        let snapshot = builder.build_from_outputs("carcore3", &[reply]);

        assert!(snapshot.results[0].structured_output().is_none());
        assert_eq!(snapshot.results[0].raw_text(), "% Invalid input");
    }
}
