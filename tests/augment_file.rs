//! End-to-end augmentation over files on disk

use std::cell::Cell;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use tempfile::{TempDir, tempdir};
use treeaug::{
    AnnotateError, Annotator, AugmentError, Omit, Schema, Sentence, SentenceReader, augment_file,
};

/// Attaches every token to the last one, which is the root
#[derive(Default)]
struct LastWordRoot {
    calls: Cell<usize>,
}

impl Annotator for LastWordRoot {
    fn annotate(&self, text: &str) -> Result<String, AnnotateError> {
        self.calls.set(self.calls.get() + 1);
        let forms: Vec<&str> = text.split(' ').filter(|f| !f.is_empty()).collect();
        let n = forms.len();
        let mut table = String::new();
        for (i, form) in forms.iter().enumerate() {
            let (pos, head, rel) = if i + 1 == n {
                ("VV", 0, "root")
            } else {
                ("NN", n, "dep")
            };
            table.push_str(&format!(
                "{}\t{}\t{}\tX\t{}\t_\t{}\t{}\t_\t_\n",
                i + 1,
                form,
                form,
                pos,
                head,
                rel
            ));
        }
        table.push('\n');
        Ok(table)
    }
}

/// Always fails, like an unreachable server
struct Unreachable;

impl Annotator for Unreachable {
    fn annotate(&self, _text: &str) -> Result<String, AnnotateError> {
        Err(AnnotateError::Status {
            url: "http://localhost:9000/".to_string(),
            status: 500,
        })
    }
}

const INPUT: &str = "1\t他\tO\t3\n2\t也\tO\t3\n3\t去\tI\t0\n\n\n1\t我\tO\t2\n2\t走\tO\t0\n";

fn write_input(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    (dir, path)
}

fn read_output(path: &PathBuf) -> Vec<Sentence> {
    SentenceReader::from_file(path, Schema::Augmented)
        .unwrap()
        .sentences()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn test_augment_file_writes_sibling() {
    let (dir, input) = write_input("sample.tsv", INPUT);
    let nlp = LastWordRoot::default();

    let summary = augment_file(&input, Schema::Plain, &nlp).unwrap();

    assert_eq!(summary.output, dir.path().join("sample.aug.tsv"));
    assert_eq!(summary.sentences, 2);
    assert_eq!(summary.tokens, 5);
    assert_eq!(nlp.calls.get(), 4);

    let expected = "# 他 也 _去_\n\
                    1\t他\tO\t_\t3\t_\tNN\t2\tdep\tNN\t3\tdep\n\
                    2\t也\tO\t_\t3\t_\tVV\t0\troot\tNN\t3\tdep\n\
                    3\t去\tI\t_\t0\t_\t_\t_\t_\tVV\t0\troot\n\
                    \n\
                    \n\
                    # 我 走\n\
                    1\t我\tO\t_\t2\t_\tNN\t2\tdep\tNN\t2\tdep\n\
                    2\t走\tO\t_\t0\t_\tVV\t0\troot\tVV\t0\troot\n\
                    \n";
    assert_eq!(fs::read_to_string(&summary.output).unwrap(), expected);
}

#[test]
fn test_output_round_trips() {
    let (_dir, input) = write_input("sample.tsv", INPUT);
    let summary = augment_file(&input, Schema::Plain, &LastWordRoot::default()).unwrap();

    let written = fs::read_to_string(&summary.output).unwrap();
    let reserialized: String = read_output(&summary.output)
        .iter()
        .map(|s| format!("{}\n", s))
        .collect();

    // The reader drops the extra blank line between the two sentences
    assert_eq!(written.replace("\n\n\n", "\n\n"), reserialized);
}

#[test]
fn test_reduced_fields_follow_omit_flags() {
    let (_dir, input) = write_input("sample.tsv", INPUT);
    let summary = augment_file(&input, Schema::Plain, &LastWordRoot::default()).unwrap();

    for sentence in read_output(&summary.output) {
        for token in &sentence.tokens {
            assert_eq!(token.secondary.reduced.is_some(), token.omit == Omit::Outside);
            assert!(token.secondary.full.is_some());
            if let Some(reduced) = &token.secondary.reduced {
                // Reduced heads always name kept tokens of the full sentence
                if reduced.head != 0 {
                    let parent = &sentence.tokens[reduced.head - 1];
                    assert_eq!(parent.omit, Omit::Outside);
                }
            }
        }
    }
}

#[test]
fn test_reaugment_augmented_file() {
    let (_dir, input) = write_input("sample.tsv", INPUT);
    let first = augment_file(&input, Schema::Plain, &LastWordRoot::default()).unwrap();
    let second = augment_file(&first.output, Schema::Augmented, &LastWordRoot::default()).unwrap();

    assert!(second.output.ends_with("sample.aug.aug.tsv"));
    assert_eq!(read_output(&first.output), read_output(&second.output));
}

#[test]
fn test_gzip_input_gives_gzip_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("sample.tsv.gz");
    let mut encoder = GzEncoder::new(File::create(&input).unwrap(), Compression::default());
    encoder.write_all(INPUT.as_bytes()).unwrap();
    encoder.finish().unwrap();

    let summary = augment_file(&input, Schema::Plain, &LastWordRoot::default()).unwrap();
    assert_eq!(summary.output, dir.path().join("sample.tsv.aug.gz"));

    let raw = fs::read(&summary.output).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);

    let mut text = String::new();
    MultiGzDecoder::new(raw.as_slice())
        .read_to_string(&mut text)
        .unwrap();
    assert!(text.starts_with("# 他 也 _去_\n"));

    let sentences = read_output(&summary.output);
    assert_eq!(sentences.len(), 2);
    assert_eq!(sentences[1].tokens[1].form, "走");
}

#[test]
fn test_service_failure_aborts() {
    let (_dir, input) = write_input("sample.tsv", INPUT);
    let err = augment_file(&input, Schema::Plain, &Unreachable).unwrap_err();
    assert!(matches!(
        err,
        AugmentError::Annotate(AnnotateError::Status { status: 500, .. })
    ));
}

#[test]
fn test_malformed_input_aborts() {
    let (_dir, input) = write_input("bad.tsv", "1\t他\tO\n\n");
    let err = augment_file(&input, Schema::Plain, &LastWordRoot::default()).unwrap_err();
    assert!(matches!(err, AugmentError::Parse(_)));
    assert!(err.to_string().contains("line 1"));
}

#[test]
fn test_missing_input() {
    let dir = tempdir().unwrap();
    let err = augment_file(
        &dir.path().join("missing.tsv"),
        Schema::Plain,
        &LastWordRoot::default(),
    )
    .unwrap_err();
    assert!(matches!(err, AugmentError::Io { .. }));
}
