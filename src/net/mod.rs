pub mod zimbra;
