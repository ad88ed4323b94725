use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::path::Path;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

// Write a few sound files into the temporary directory
fn make_sounds(temp_dir: &tempfile::TempDir) -> Result<(),brut::DYNERR> {
    let text = "I am Sam. Sam I am. I do not like this Sam I am.\n".repeat(40);
    std::fs::write(temp_dir.path().join("sam.wav"),text)?;
    std::fs::write(temp_dir.path().join("beep.wav"),[0x80;300])?;
    std::fs::write(temp_dir.path().join("notes.txt"),"not a sound")?;
    Ok(())
}

fn add_sounds(res_path: &Path,temp_dir: &tempfile::TempDir) -> STDRESULT {
    let pattern = temp_dir.path().join("*.wav");
    Command::cargo_bin("brut")?
        .arg(res_path)
        .arg("add")
        .arg(&pattern)
        .assert()
        .success();
    Ok(())
}

#[test]
fn add_and_list() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    make_sounds(&temp_dir)?;
    let res_path = temp_dir.path().join("TEST.RES");
    add_sounds(&res_path,&temp_dir)?;
    Command::cargo_bin("brut")?
        .arg(&res_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("BEEP.WAV"))
        .stdout(predicate::str::contains("SAM.WAV"))
        .stdout(predicate::str::contains("NOTES.TXT").not());
    Command::cargo_bin("brut")?
        .arg(&res_path)
        .arg("list")
        .arg("--verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("LZSS compressed"));
    Ok(())
}

#[test]
fn extract_round_trip() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    make_sounds(&temp_dir)?;
    let res_path = temp_dir.path().join("TEST.RES");
    add_sounds(&res_path,&temp_dir)?;
    let out_dir = tempfile::tempdir()?;
    Command::cargo_bin("brut")?
        .arg(&res_path)
        .arg("extract")
        .arg("sam.wav")
        .arg("-d").arg(out_dir.path())
        .assert()
        .success();
    match (std::fs::read(temp_dir.path().join("sam.wav")),std::fs::read(out_dir.path().join("SAM.WAV"))) {
        (Ok(v1),Ok(v2)) => {
            assert_eq!(v1,v2);
        },
        _ => panic!("unable to compare output with reference")
    }
    Command::cargo_bin("brut")?
        .arg(&res_path)
        .arg("extract-all")
        .arg("-d").arg(out_dir.path())
        .assert()
        .success();
    assert_eq!(std::fs::read(out_dir.path().join("BEEP.WAV"))?,vec![0x80;300]);
    Ok(())
}

#[test]
fn remove_resources() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    make_sounds(&temp_dir)?;
    let res_path = temp_dir.path().join("TEST.RES");
    add_sounds(&res_path,&temp_dir)?;
    let old_len = std::fs::metadata(&res_path)?.len();
    Command::cargo_bin("brut")?
        .arg(&res_path)
        .arg("remove")
        .arg("BEEP.WAV").arg("MISSING.WAV")
        .assert()
        .failure();
    assert_eq!(std::fs::metadata(&res_path)?.len(),old_len);
    Command::cargo_bin("brut")?
        .arg(&res_path)
        .arg("remove")
        .arg("beep.wav").arg("BEEP.WAV")
        .assert()
        .success()
        .stderr(predicate::str::contains("removed 1 resources, 1 remain"));
    assert!(std::fs::metadata(&res_path)?.len() < old_len);
    Command::cargo_bin("brut")?
        .arg(&res_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("SAM.WAV"))
        .stdout(predicate::str::contains("BEEP.WAV").not());
    Ok(())
}

#[test]
fn unsupported_version() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let res_path = temp_dir.path().join("OLD.RES");
    let mut header = 0x300u32.to_le_bytes().to_vec();
    header.extend_from_slice(&12u32.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes());
    std::fs::write(&res_path,header)?;
    Command::cargo_bin("brut")?
        .arg(&res_path)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("UnsupportedVersion"));
    Ok(())
}
