#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.join(name)).expect("read workspace file")
    }
}

pub const CUSTOMERS_CSV: &str = "\
Nome,Telefone,Endereço,Observação
Ana Souza,(11) 98765-4321,\"Rua João, 234, Jardim Primavera, Sorocaba - SP, 18000000\",vip
Bruno Lima,123,\"Rua das Flores 10, casa 2, Centro, Itu/SP\",
Carla Dias,5515912345678,Rua Sem Numero,
Davi Rocha,87654321,Avenida Brasil 99;Rua Dois 7 Vila Nova,atacado
";

pub const DISTRICTS_CSV: &str = "\
Estado,Cidade,Bairros
SP,Sorocaba,Jardim Primavera
SP,Itu,Centro
";

/// Parses a CSV produced by the tool into header-keyed rows.
pub fn read_output(path: &Path) -> (Vec<String>, Vec<Vec<(String, String)>>) {
    let mut reader = csv::Reader::from_path(path).expect("open output csv");
    let headers: Vec<String> = reader
        .headers()
        .expect("headers")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| {
            let record = record.expect("record");
            headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect()
        })
        .collect();
    (headers, rows)
}

pub fn field<'a>(row: &'a [(String, String)], column: &str) -> &'a str {
    row.iter()
        .find(|(name, _)| name == column)
        .map(|(_, value)| value.as_str())
        .unwrap_or("")
}
