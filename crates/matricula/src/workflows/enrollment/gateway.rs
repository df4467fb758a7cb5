use async_trait::async_trait;

use crate::records::{
    Enrollment, EnrollmentId, NewEnrollment, NewPayment, NewStudent, Payment, PaymentId, Student,
    StudentId,
};

/// Failure talking to the records backend. Connectivity problems carry no
/// HTTP status and normalize to `statusCode: 0`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("{message}")]
    Backend { status_code: u16, message: String },
    #[error("no se pudo conectar con el servidor: {0}")]
    Connection(String),
}

impl GatewayError {
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Backend { status_code, .. } => *status_code,
            GatewayError::Connection(_) => 0,
        }
    }

    /// Message shown to the operator: the backend body when present,
    /// otherwise a generic cannot-connect text.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Backend { message, .. } => message.clone(),
            GatewayError::Connection(_) => "No se pudo conectar con el servidor".to_string(),
        }
    }
}

#[async_trait]
pub trait StudentGateway: Send + Sync {
    async fn find_by_dni(&self, dni: &str) -> Result<Option<Student>, GatewayError>;
    async fn fetch(&self, id: StudentId) -> Result<Option<Student>, GatewayError>;
    async fn create(&self, student: NewStudent) -> Result<Student, GatewayError>;
}

#[async_trait]
pub trait EnrollmentGateway: Send + Sync {
    async fn create(&self, enrollment: NewEnrollment) -> Result<Enrollment, GatewayError>;
    async fn delete(&self, id: EnrollmentId) -> Result<(), GatewayError>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create(&self, payment: NewPayment) -> Result<Payment, GatewayError>;
    async fn delete(&self, id: PaymentId) -> Result<(), GatewayError>;
}
