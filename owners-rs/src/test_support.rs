use crate::{owner::Owner, repo::MemoryRepo, Database};

pub(crate) const BEN: &str = "ben@example.com";
pub(crate) const BRETT: &str = "brett@example.com";
pub(crate) const DARIN: &str = "darin@example.com";
pub(crate) const JOHN: &str = "john@example.com";
pub(crate) const KEN: &str = "ken@example.com";
pub(crate) const PETER: &str = "peter@example.com";
pub(crate) const TOM: &str = "tom@example.com";

pub(crate) const ELIJAH: &str = "elijah@example.com";
pub(crate) const EVGENY: &str = "evgeny@example.com";
pub(crate) const HAMAJI: &str = "hamaji@example.com";
pub(crate) const LLOYD: &str = "lloyd@example.com";
pub(crate) const NIKOLAY: &str = "nikolay@example.com";
pub(crate) const SATORU: &str = "satoru@example.com";
pub(crate) const YUSUKE: &str = "yusuke@example.com";

#[derive(Default)]
pub(crate) struct OwnersFile<'a> {
    pub(crate) owners: &'a [&'a str],
    pub(crate) comment: Option<&'a str>,
    pub(crate) noparent: bool,
    pub(crate) lines: &'a [&'a str],
}

impl OwnersFile<'_> {
    pub(crate) fn render(&self) -> String {
        let mut s = String::new();
        if let Some(comment) = self.comment {
            s.push_str(&format!("# {}\n", comment));
        }
        if self.noparent {
            s.push_str("set noparent\n");
        }
        s.push_str(&self.lines.join("\n"));
        s.push('\n');
        s.push_str(&self.owners.join("\n"));
        s.push('\n');
        s
    }
}

pub(crate) fn owners_file(owners: &[&str]) -> String {
    OwnersFile {
        owners,
        ..Default::default()
    }
    .render()
}

pub(crate) fn owner(s: &str) -> Owner {
    Owner::parse(s).expect("valid owner")
}

/// A small tree with nested OWNERS files, noparent blocks and a wildcard at
/// the root.
pub(crate) fn test_repo() -> MemoryRepo {
    MemoryRepo::from_iter([
        ("/DEPS", String::new()),
        ("/OWNERS", owners_file(&["*"])),
        ("/base/vlog.h", String::new()),
        ("/chrome/OWNERS", owners_file(&[BEN, BRETT])),
        ("/chrome/browser/OWNERS", owners_file(&[BRETT])),
        ("/chrome/browser/defaults.h", String::new()),
        ("/chrome/gpu/OWNERS", owners_file(&[KEN])),
        ("/chrome/gpu/gpu_channel.h", String::new()),
        ("/chrome/renderer/OWNERS", owners_file(&[PETER])),
        ("/chrome/renderer/gpu/gpu_channel_host.h", String::new()),
        ("/chrome/renderer/safe_browsing/scorer.h", String::new()),
        (
            "/content/OWNERS",
            OwnersFile {
                owners: &[JOHN, DARIN],
                comment: Some("foo"),
                noparent: true,
                ..Default::default()
            }
            .render(),
        ),
        ("/content/content.gyp", String::new()),
        ("/content/bar/foo.cc", String::new()),
        ("/content/baz/OWNERS", owners_file(&[BRETT])),
        ("/content/baz/froboz.h", String::new()),
        ("/content/baz/ugly.cc", String::new()),
        ("/content/baz/ugly.h", String::new()),
        (
            "/content/views/OWNERS",
            OwnersFile {
                owners: &[BEN, JOHN, "*"],
                noparent: true,
                ..Default::default()
            }
            .render(),
        ),
        ("/content/views/pie.h", String::new()),
    ])
}

/// A tree with comment labels and a per-file wildcard, for reviewer sets.
pub(crate) fn reviewer_set_repo() -> MemoryRepo {
    MemoryRepo::from_iter([
        (
            "/OWNERS",
            OwnersFile {
                owners: &[HAMAJI, YUSUKE],
                comment: Some("misc"),
                ..Default::default()
            }
            .render(),
        ),
        ("/mods/android/random.c", String::new()),
        (
            "/src/build/cts/OWNERS",
            OwnersFile {
                owners: &[LLOYD],
                lines: &["per-file cts_run_configuration.py=*"],
                ..Default::default()
            }
            .render(),
        ),
        ("/src/build/cts/cts_run_configuration.py", String::new()),
        ("/src/build/cts/random.c", String::new()),
        ("/src/ndk_translation/OWNERS", owners_file(&[EVGENY, NIKOLAY])),
        (
            "/src/packaging/OWNERS",
            OwnersFile {
                owners: &[ELIJAH],
                comment: Some("packaging"),
                ..Default::default()
            }
            .render(),
        ),
        ("/src/packaging/runtime/filesystem.js", String::new()),
        ("/src/plugin/OWNERS", owners_file(&[KEN])),
        ("/src/plugin/file_system_manager.cc", String::new()),
        ("/src/posix_translation/OWNERS", owners_file(&[SATORU])),
        ("/src/posix_translation/external_file.cc", String::new()),
    ])
}

pub(crate) fn db(repo: &MemoryRepo) -> Database<&MemoryRepo> {
    Database::new("/", repo)
}
