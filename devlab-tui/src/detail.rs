//! Detail-page layout — decide how many fields of each section fit.
//!
//! A detail overlay is an ordered list of sections, each a title plus
//! label/value rows. Terminal height is finite, so sections are granted
//! rows greedily in order: a header line if it fits, then field rows, with
//! a trailing "+k more" marker on any truncated section. Rendered rows
//! never exceed the available height.

use devlab_core::types::{
    fmt_bytes, fmt_epoch_ms, BenchmarkJob, Blueprint, Devbox, DiskSnapshot, GatewayConfig,
    McpConfig, NetworkPolicy, StorageObject,
};

/// One titled group of label/value rows.
#[derive(Debug, Clone)]
pub struct Section {
    pub title: String,
    pub fields: Vec<(String, String)>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((label.into(), value.into()));
        self
    }

    /// Add the field only when the value is present.
    pub fn field_opt(self, label: impl Into<String>, value: Option<String>) -> Self {
        match value {
            Some(v) => self.field(label, v),
            None => self,
        }
    }
}

/// Layout decision for one section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionFit {
    /// Whether the section header is rendered at all.
    pub header: bool,
    /// Field rows granted.
    pub shown: usize,
    /// Hidden field count; > 0 means a "+k more" marker row is rendered
    /// (when there was room for it).
    pub hidden: usize,
    /// Whether the marker row itself fit.
    pub marker: bool,
}

impl SectionFit {
    fn rows(&self) -> usize {
        if !self.header {
            return 0;
        }
        1 + self.shown + usize::from(self.marker)
    }
}

/// Allocate `available` rows across sections. A blank separator row is
/// accounted between consecutive rendered sections.
pub fn allocate(sections: &[Section], available: usize) -> Vec<SectionFit> {
    let mut fits = vec![SectionFit::default(); sections.len()];
    let mut remaining = available;
    let mut rendered_any = false;

    for (i, section) in sections.iter().enumerate() {
        let separator = usize::from(rendered_any);
        if remaining < separator + 1 {
            break;
        }
        remaining -= separator + 1;
        fits[i].header = true;
        rendered_any = true;

        let want = section.fields.len();
        if want <= remaining {
            fits[i].shown = want;
            remaining -= want;
        } else if remaining >= 1 {
            // Reserve the last row for the marker.
            fits[i].shown = remaining - 1;
            fits[i].hidden = want - fits[i].shown;
            fits[i].marker = true;
            remaining = 0;
        } else {
            fits[i].hidden = want;
        }
    }

    fits
}

/// Total rows the allocation renders, separators included.
pub fn rendered_rows(fits: &[SectionFit]) -> usize {
    let rendered = fits.iter().filter(|f| f.header).count();
    let separators = rendered.saturating_sub(1);
    fits.iter().map(SectionFit::rows).sum::<usize>() + separators
}

// ---------------------------------------------------------------------------
// Per-resource section builders

pub fn devbox_sections(d: &Devbox) -> Vec<Section> {
    let mut sections = vec![
        Section::new("Overview")
            .field("Id", &d.id)
            .field_opt("Name", d.name.clone())
            .field("Status", d.status.as_str())
            .field_opt("Blueprint", d.blueprint_id.clone())
            .field_opt("Snapshot", d.snapshot_id.clone())
            .field_opt("Failure reason", d.failure_reason.clone()),
        Section::new("Timing")
            .field("Created", fmt_epoch_ms(d.create_time_ms))
            .field_opt("Ended", d.end_time_ms.map(|ms| fmt_epoch_ms(Some(ms)))),
    ];

    if let Some(lp) = &d.launch_parameters {
        let mut launch = Section::new("Launch parameters")
            .field_opt(
                "Resources",
                lp.resource_size_request.map(|r| format!("{r:?}")),
            )
            .field_opt("Architecture", lp.architecture.clone())
            .field_opt(
                "Launch commands",
                lp.launch_commands.as_ref().map(|c| c.join(" && ")),
            )
            .field_opt(
                "Ports",
                lp.available_ports.as_ref().map(|p| {
                    p.iter()
                        .map(u16::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                }),
            );
        if let Some(idle) = &lp.after_idle {
            launch = launch.field(
                "After idle",
                format!("{:?} after {}s", idle.on_idle, idle.idle_time_seconds),
            );
        }
        if let Some(user) = &lp.user_parameters {
            launch = launch.field("User", format!("{} (uid {})", user.username, user.uid));
        }
        sections.push(launch);
    }

    sections
}

pub fn blueprint_sections(b: &Blueprint) -> Vec<Section> {
    let mut sections = vec![Section::new("Overview")
        .field("Id", &b.id)
        .field("Name", &b.name)
        .field("Status", b.status.as_str())
        .field("Created", fmt_epoch_ms(b.create_time_ms))
        .field_opt("Failure reason", b.failure_reason.clone())];

    if let Some(cmds) = &b.system_setup_commands {
        let mut setup = Section::new("System setup commands");
        for (i, cmd) in cmds.iter().enumerate() {
            setup = setup.field(format!("{}", i + 1), cmd.clone());
        }
        sections.push(setup);
    }

    if let Some(dockerfile) = &b.dockerfile {
        let mut docker = Section::new("Dockerfile");
        for line in dockerfile.lines().take(20) {
            docker = docker.field("", line.to_string());
        }
        sections.push(docker);
    }

    sections
}

pub fn snapshot_sections(s: &DiskSnapshot) -> Vec<Section> {
    vec![Section::new("Overview")
        .field("Id", &s.id)
        .field_opt("Name", s.name.clone())
        .field("Devbox", &s.devbox_id)
        .field("Status", s.status.as_str())
        .field("Created", fmt_epoch_ms(s.create_time_ms))
        .field("Size", fmt_bytes(s.size_bytes))]
}

pub fn object_sections(o: &StorageObject) -> Vec<Section> {
    vec![Section::new("Overview")
        .field("Id", &o.id)
        .field("Name", &o.name)
        .field("Content type", &o.content_type)
        .field("State", o.state.as_str())
        .field("Size", fmt_bytes(o.size_bytes))
        .field("Public", if o.is_public { "yes" } else { "no" })
        .field("Created", fmt_epoch_ms(o.create_time_ms))]
}

pub fn policy_sections(p: &NetworkPolicy) -> Vec<Section> {
    let mut sections = vec![Section::new("Overview")
        .field("Id", &p.id)
        .field("Name", &p.name)
        .field(
            "Default",
            if p.deny_by_default {
                "deny"
            } else {
                "allow"
            },
        )
        .field("Created", fmt_epoch_ms(p.create_time_ms))];

    if !p.allowed_hosts.is_empty() {
        let mut hosts = Section::new("Allowed hosts");
        for host in &p.allowed_hosts {
            hosts = hosts.field("", host.clone());
        }
        sections.push(hosts);
    }

    sections
}

pub fn job_sections(j: &BenchmarkJob) -> Vec<Section> {
    vec![
        Section::new("Overview")
            .field("Id", &j.id)
            .field_opt("Name", j.name.clone())
            .field("Benchmark", &j.benchmark_id)
            .field("Status", j.status.as_str()),
        Section::new("Results")
            .field(
                "Scenarios",
                format!("{}/{} passed", j.passed_count, j.scenario_count),
            )
            .field("Started", fmt_epoch_ms(j.start_time_ms))
            .field_opt(
                "Duration",
                j.duration_ms.map(|ms| format!("{:.1}s", ms as f64 / 1000.0)),
            ),
    ]
}

pub fn mcp_sections(m: &McpConfig) -> Vec<Section> {
    vec![Section::new("MCP config")
        .field("Id", &m.id)
        .field("Name", &m.name)
        .field("URL", &m.url)
        .field("Enabled", if m.enabled { "yes" } else { "no" })]
}

pub fn gateway_sections(g: &GatewayConfig) -> Vec<Section> {
    vec![Section::new("Gateway config")
        .field("Id", &g.id)
        .field("Name", &g.name)
        .field("Endpoint", &g.endpoint)
        .field_opt("Region", g.region.clone())
        .field("Enabled", if g.enabled { "yes" } else { "no" })]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn section(fields: usize) -> Section {
        let mut s = Section::new("S");
        for i in 0..fields {
            s = s.field(format!("f{i}"), "v");
        }
        s
    }

    #[test]
    fn everything_fits_when_room_is_ample() {
        let sections = vec![section(3), section(2)];
        // 1+3 + sep + 1+2 = 8
        let fits = allocate(&sections, 8);
        assert_eq!(fits[0], SectionFit { header: true, shown: 3, hidden: 0, marker: false });
        assert_eq!(fits[1], SectionFit { header: true, shown: 2, hidden: 0, marker: false });
        assert_eq!(rendered_rows(&fits), 8);
    }

    #[test]
    fn truncated_section_gets_marker_row() {
        let sections = vec![section(10)];
        let fits = allocate(&sections, 5);
        // header + 3 fields + marker
        assert_eq!(fits[0].shown, 3);
        assert_eq!(fits[0].hidden, 7);
        assert!(fits[0].marker);
        assert_eq!(rendered_rows(&fits), 5);
    }

    #[test]
    fn later_sections_dropped_before_earlier_ones() {
        let sections = vec![section(3), section(3)];
        let fits = allocate(&sections, 4);
        assert!(fits[0].header);
        assert_eq!(fits[0].shown, 3);
        assert!(!fits[1].header);
        assert_eq!(rendered_rows(&fits), 4);
    }

    #[test]
    fn header_only_when_one_row_left() {
        let sections = vec![section(2), section(4)];
        // 1+2 + sep + 1 = 5: second section gets a bare header.
        let fits = allocate(&sections, 5);
        assert!(fits[1].header);
        assert_eq!(fits[1].shown, 0);
        assert!(!fits[1].marker);
        assert_eq!(fits[1].hidden, 4);
        assert_eq!(rendered_rows(&fits), 5);
    }

    #[test]
    fn zero_height_renders_nothing() {
        let fits = allocate(&[section(3)], 0);
        assert!(!fits[0].header);
        assert_eq!(rendered_rows(&fits), 0);
    }

    #[test]
    fn devbox_sections_cover_launch_parameters() {
        let d = Devbox {
            id: "dbx_1".into(),
            name: Some("web".into()),
            status: devlab_core::types::DevboxStatus::Running,
            blueprint_id: None,
            snapshot_id: None,
            create_time_ms: Some(1_700_000_000_000),
            end_time_ms: None,
            failure_reason: None,
            launch_parameters: Some(devlab_core::types::LaunchParameters {
                resource_size_request: Some(devlab_core::types::ResourceSize::Small),
                ..Default::default()
            }),
        };
        let sections = devbox_sections(&d);
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].title, "Overview");
        assert_eq!(sections[2].title, "Launch parameters");
    }

    proptest! {
        /// The allocator never renders more rows than it was given.
        #[test]
        fn never_overflows(
            field_counts in proptest::collection::vec(0usize..12, 1..8),
            available in 0usize..40,
        ) {
            let sections: Vec<Section> = field_counts.into_iter().map(section).collect();
            let fits = allocate(&sections, available);
            prop_assert!(rendered_rows(&fits) <= available);
        }

        /// With enough room, every field of every section is shown.
        #[test]
        fn shows_everything_given_room(
            field_counts in proptest::collection::vec(0usize..12, 1..8),
        ) {
            let sections: Vec<Section> = field_counts.iter().copied().map(section).collect();
            let need: usize = sections.iter().map(|s| 1 + s.fields.len()).sum::<usize>()
                + sections.len().saturating_sub(1);
            let fits = allocate(&sections, need);
            for (fit, count) in fits.iter().zip(field_counts) {
                prop_assert!(fit.header);
                prop_assert_eq!(fit.shown, count);
                prop_assert_eq!(fit.hidden, 0);
            }
        }
    }
}
