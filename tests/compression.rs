#[cfg(feature = "compression-gzip")]
mod gzip_tests {
    use anyhow::Result;
    use jsonl_shards::testing::*;
    use jsonl_shards::{
        Compression, DatasetError, DatasetReader, LineSource, ReadStrategy, ReaderOptions,
        ShardedWriter, WriterOptions,
    };
    use serde_json::json;
    use std::fs;

    fn gz_options(max: usize) -> WriterOptions {
        WriterOptions::default()
            .with_max_shard_size(max)
            .with_compress(true)
    }

    #[test]
    fn writer_produces_gzip_shards() -> Result<()> {
        let ds = TempDataset::new()?;
        let mut writer = ShardedWriter::create(ds.path(), gz_options(2))?;
        writer.write_line(&json!({"a": 1}))?;
        writer.write_line(&json!({"b": 2}))?;
        writer.close()?;

        assert_eq!(ds.file_names()?, vec!["shard_00000.jsonl.gz"]);
        let path = ds.path().join("shard_00000.jsonl.gz");
        let raw = fs::read(&path)?;
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
        assert_eq!(shard_text(&path)?, "{\"a\":1}\n{\"b\":2}");
        Ok(())
    }

    #[test]
    fn gzip_resume_appends_a_new_member() -> Result<()> {
        let ds = TempDataset::new()?;
        for record in [json!({"a": 1}), json!({"b": 2}), json!({"c": 3})] {
            let mut writer = ShardedWriter::create(ds.path(), gz_options(2))?;
            writer.write_line(&record)?;
            writer.close()?;
        }

        assert_eq!(
            ds.file_names()?,
            vec!["shard_00000.jsonl.gz", "shard_00001.jsonl.gz"]
        );
        assert_eq!(
            read_shard(ds.path().join("shard_00000.jsonl.gz"))?,
            vec![json!({"a": 1}), json!({"b": 2})]
        );
        assert_eq!(
            read_shard(ds.path().join("shard_00001.jsonl.gz"))?,
            vec![json!({"c": 3})]
        );
        Ok(())
    }

    #[test]
    fn plain_and_gzip_writers_do_not_see_each_other() -> Result<()> {
        let ds = TempDataset::new()?;
        let mut plain = ShardedWriter::create(ds.path(), WriterOptions::default().with_max_shard_size(1))?;
        plain.write_line(&json!(1))?;
        plain.close()?;

        let gz = ShardedWriter::create(ds.path(), gz_options(1))?;
        assert_eq!(gz.current_shard(), 0);
        assert_eq!(gz.layout().compression(), Compression::Gzip);
        gz.close()?;
        Ok(())
    }

    #[test]
    fn reader_mixes_plain_and_gzip() -> Result<()> {
        let ds = TempDataset::new()?;
        ds.add_gzip_shard("a.jsonl.gz", &[json!({"a": 1}), json!({"a": 2})])?;
        ds.add_shard("b.jsonl", &[json!({"b": 3}), json!({"b": 4})])?;

        let opts = ReaderOptions::default().with_strategy(ReadStrategy::RoundRobin);
        let reader: DatasetReader = DatasetReader::open(ds.path(), opts)?;
        assert_eq!(
            reader.read_all()?,
            vec![json!({"a": 1}), json!({"b": 3}), json!({"a": 2}), json!({"b": 4})]
        );
        Ok(())
    }

    #[test]
    fn truncated_gzip_fails_mid_stream() -> Result<()> {
        let ds = TempDataset::new()?;
        let records = numbered_records("id", 0..2_000);
        let path = ds.add_gzip_shard("a.jsonl.gz", &records)?;
        let bytes = fs::read(&path)?;
        fs::write(&path, &bytes[..bytes.len() / 2])?;

        let mut ok = 0;
        let mut failed = false;
        for line in LineSource::new(&path).lines() {
            match line {
                Ok(_) => ok += 1,
                Err(err) => {
                    assert!(matches!(err, DatasetError::Io { .. }));
                    failed = true;
                }
            }
        }
        assert!(failed);
        assert!(ok < records.len());
        Ok(())
    }
}
