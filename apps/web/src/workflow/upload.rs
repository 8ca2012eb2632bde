//! Client-side validation of the upload form. Nothing leaves the process
//! until an `AnalyzeRequest` has been built, and the only way to build one is
//! `AnalyzeInput::validate`.

use bytes::Bytes;
use thiserror::Error;

use crate::workflow::wizard::FormDraft;

pub const MAX_CV_BYTES: usize = 10 * 1024 * 1024;
const PDF_MIME: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Please upload your master CV.")]
    MissingFile,

    #[error("Please upload a PDF file.")]
    NotPdf,

    #[error("The uploaded file is empty.")]
    EmptyFile,

    #[error("Maximum file size is 10MB.")]
    TooLarge,

    #[error("Paste a job description or provide a job URL.")]
    MissingJobSource,

    #[error("Company website is required.")]
    MissingCompanyUrl,
}

/// The CV as it arrived in the multipart form.
#[derive(Debug, Clone)]
pub struct CvUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl CvUpload {
    fn is_pdf(&self) -> bool {
        match self.content_type.as_deref() {
            Some(PDF_MIME) => true,
            // Some browsers send a generic type for drag-and-drop uploads.
            Some("application/octet-stream") | None => {
                self.file_name.to_ascii_lowercase().ends_with(".pdf")
            }
            Some(_) => false,
        }
    }
}

/// Raw form values, untrimmed.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeInput {
    pub cv: Option<CvUpload>,
    pub job_description: String,
    pub job_url: String,
    pub company_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    Description(String),
    Url(String),
}

impl JobSource {
    pub fn is_url(&self) -> bool {
        matches!(self, JobSource::Url(_))
    }
}

/// A validated step 1 request.
#[derive(Debug, Clone)]
pub struct AnalyzeRequest {
    cv: CvUpload,
    job: JobSource,
    company_url: String,
}

impl AnalyzeRequest {
    pub fn cv(&self) -> &CvUpload {
        &self.cv
    }

    pub fn job(&self) -> &JobSource {
        &self.job
    }

    pub fn company_url(&self) -> &str {
        &self.company_url
    }
}

impl AnalyzeInput {
    /// The text fields, for re-rendering the form.
    pub fn draft(&self) -> FormDraft {
        FormDraft {
            job_description: self.job_description.clone(),
            job_url: self.job_url.clone(),
            company_url: self.company_url.clone(),
        }
    }

    pub fn validate(self) -> Result<AnalyzeRequest, UploadError> {
        let cv = self.cv.ok_or(UploadError::MissingFile)?;
        if !cv.is_pdf() {
            return Err(UploadError::NotPdf);
        }
        if cv.bytes.is_empty() {
            return Err(UploadError::EmptyFile);
        }
        if cv.bytes.len() > MAX_CV_BYTES {
            return Err(UploadError::TooLarge);
        }

        let description = self.job_description.trim();
        let url = self.job_url.trim();
        let job = if !description.is_empty() {
            JobSource::Description(description.to_string())
        } else if !url.is_empty() {
            JobSource::Url(url.to_string())
        } else {
            return Err(UploadError::MissingJobSource);
        };

        let company_url = self.company_url.trim();
        if company_url.is_empty() {
            return Err(UploadError::MissingCompanyUrl);
        }

        Ok(AnalyzeRequest {
            cv,
            job,
            company_url: company_url.to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) fn pdf_upload() -> CvUpload {
    CvUpload {
        file_name: "resume.pdf".to_string(),
        content_type: Some(PDF_MIME.to_string()),
        bytes: Bytes::from_static(b"%PDF-1.7 test"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(cv: Option<CvUpload>, description: &str, url: &str, company: &str) -> AnalyzeInput {
        AnalyzeInput {
            cv,
            job_description: description.to_string(),
            job_url: url.to_string(),
            company_url: company.to_string(),
        }
    }

    #[test]
    fn test_valid_description_request() {
        let request = input(Some(pdf_upload()), "  Build APIs  ", "", " stripe.com ")
            .validate()
            .unwrap();
        assert_eq!(
            request.job(),
            &JobSource::Description("Build APIs".to_string())
        );
        assert_eq!(request.company_url(), "stripe.com");
    }

    #[test]
    fn test_non_pdf_is_rejected() {
        let docx = CvUpload {
            file_name: "resume.docx".to_string(),
            content_type: Some(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .to_string(),
            ),
            bytes: Bytes::from_static(b"PK"),
        };
        let err = input(Some(docx), "desc", "", "stripe.com")
            .validate()
            .unwrap_err();
        assert_eq!(err, UploadError::NotPdf);
        assert_eq!(err.to_string(), "Please upload a PDF file.");
    }

    #[test]
    fn test_octet_stream_with_pdf_extension_is_accepted() {
        let cv = CvUpload {
            content_type: Some("application/octet-stream".to_string()),
            file_name: "CV.PDF".to_string(),
            ..pdf_upload()
        };
        assert!(input(Some(cv), "desc", "", "stripe.com").validate().is_ok());
    }

    #[test]
    fn test_empty_job_source_is_rejected() {
        let err = input(Some(pdf_upload()), "   ", "", "stripe.com")
            .validate()
            .unwrap_err();
        assert_eq!(err, UploadError::MissingJobSource);
    }

    #[test]
    fn test_description_wins_over_url() {
        let request = input(
            Some(pdf_upload()),
            "Senior Go role",
            "https://example.com/jobs/1",
            "example.com",
        )
        .validate()
        .unwrap();
        assert!(!request.job().is_url());
    }

    #[test]
    fn test_url_only_source() {
        let request = input(Some(pdf_upload()), "", "https://example.com/jobs/1", "x.io")
            .validate()
            .unwrap();
        assert_eq!(
            request.job(),
            &JobSource::Url("https://example.com/jobs/1".to_string())
        );
    }

    #[test]
    fn test_missing_file_and_company() {
        assert_eq!(
            input(None, "desc", "", "x.io").validate().unwrap_err(),
            UploadError::MissingFile
        );
        assert_eq!(
            input(Some(pdf_upload()), "desc", "", "  ").validate().unwrap_err(),
            UploadError::MissingCompanyUrl
        );
    }

    #[test]
    fn test_size_limits() {
        let empty = CvUpload {
            bytes: Bytes::new(),
            ..pdf_upload()
        };
        assert_eq!(
            input(Some(empty), "d", "", "x.io").validate().unwrap_err(),
            UploadError::EmptyFile
        );

        let huge = CvUpload {
            bytes: Bytes::from(vec![0u8; MAX_CV_BYTES + 1]),
            ..pdf_upload()
        };
        assert_eq!(
            input(Some(huge), "d", "", "x.io").validate().unwrap_err(),
            UploadError::TooLarge
        );
    }
}
