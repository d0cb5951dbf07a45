//! Loading and exporting through `DesignHost`.

#[cfg(feature = "interchange")]
mod host {
    use std::io::Write;

    use hwmeta::MergeOptions;
    use hwmeta::interchange::{DesignHost, InterchangeError, detect_format};

    use crate::helpers::fixtures::DMA_GPIO_HWH;

    fn file_with(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn hwh_file_loads_by_extension() {
        let file = file_with(".hwh", DMA_GPIO_HWH);
        let host = DesignHost::from_file(file.path()).unwrap();
        assert_eq!(host.design().name(), "top");
        assert!(host.design().lookup("dma0[block]:M_AXI[port]").is_ok());
    }

    #[test]
    fn json_written_to_disk_loads_back() {
        let host = DesignHost::from_hwh_str(DMA_GPIO_HWH).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.json");
        host.write_file(&path).unwrap();

        let reloaded = DesignHost::from_file(&path).unwrap();
        assert_eq!(reloaded.design().len(), host.design().len());
        assert_eq!(reloaded.to_json().unwrap(), host.to_json().unwrap());
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let file = file_with(".xsa", "");
        let err = DesignHost::from_file(file.path()).unwrap_err();
        assert!(matches!(err, InterchangeError::Unsupported(_)));
        assert!(detect_format(file.path()).is_none());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DesignHost::from_file(&dir.path().join("absent.hwh")).unwrap_err();
        assert!(matches!(err, InterchangeError::Io(_)));
    }

    #[test]
    fn hosts_merge() {
        let mut host = DesignHost::from_hwh_str(DMA_GPIO_HWH).unwrap();
        let json = host.to_json().unwrap();
        let other = DesignHost::from_json_str(&json).unwrap();
        host.merge(other, MergeOptions::default()).unwrap();
        assert_eq!(host.to_json().unwrap(), json);
    }

    #[test]
    fn debug_output_summarizes_the_design() {
        let host = DesignHost::from_hwh_str(DMA_GPIO_HWH).unwrap();
        let debug = format!("{host:?}");
        assert!(debug.contains("DesignHost"));
        assert!(debug.contains("\"top\""));
    }
}
